use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::controller::Prompter;

#[instrument]
pub fn get_user_input() -> Result<Vec<String>> {
    println!("请输入小说目录页地址(以空格分割): ");
    let mut urls = String::new();
    io::stdin().read_line(&mut urls)?;
    debug!("用户输入: {}", urls);
    Ok(parse_urls(&urls))
}

fn parse_urls(input: &str) -> Vec<String> {
    input.split_whitespace().map(|s| s.to_owned()).collect()
}

pub fn ask_yes_no(question: &str) -> Result<bool> {
    print!("{} (y/n): ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// 终端里的确认与提示
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        ask_yes_no(message)
    }

    fn alert(&self, message: &str) {
        eprintln!("\n{}\n", message);
    }
}

pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        let ms_remaining = total_ms % 1000;

        if ms_remaining > 0 {
            format!("{}分{}秒{}毫秒", mins, secs, ms_remaining)
        } else {
            format!("{}分{}秒", mins, secs)
        }
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;

        if ms_remaining > 0 {
            format!("{}秒{}毫秒", secs, ms_remaining)
        } else {
            format!("{}秒", secs)
        }
    } else {
        format!("{}毫秒", total_ms)
    }
}

#[instrument]
pub fn display_elapsed_time(duration: Duration) {
    info!("✅ 处理完成！耗时: {}", format_elapsed(duration));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_is_human_readable() {
        assert_eq!(format_elapsed(Duration::from_millis(250)), "250毫秒");
        assert_eq!(format_elapsed(Duration::from_millis(2000)), "2秒");
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2秒500毫秒");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2分5秒");
        assert_eq!(format_elapsed(Duration::from_millis(60_001)), "1分0秒1毫秒");
    }

    #[test]
    fn urls_split_on_whitespace() {
        assert_eq!(
            parse_urls("  https://a.example/x \t https://b.example/y\n"),
            vec!["https://a.example/x", "https://b.example/y"]
        );
        assert!(parse_urls("\n").is_empty());
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
