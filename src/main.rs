use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use noblemtl_fetch::config::get_config;
use noblemtl_fetch::crawler::{Downloader, Parser, TokioClock};
use noblemtl_fetch::shield::{InteractionShield, PageEvents};
use noblemtl_fetch::utils::{TerminalPrompter, display_elapsed_time};
use noblemtl_fetch::{
    Controller, FsSink, HtmlDocument, HttpChapterFetcher, Outcome, get_user_input, logger,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();
    let policy = get_config()?.policy()?;

    // 整个进程内有效, 不再卸载
    let mut page_events = PageEvents::new();
    let _shield = InteractionShield::install(&mut page_events);

    let downloader = Downloader::new()?;
    let controller = Controller::new(
        Arc::new(HttpChapterFetcher::new(downloader.clone(), Parser)),
        Arc::new(TokioClock),
        Arc::new(FsSink::current_dir()?),
        Arc::new(TerminalPrompter),
        policy,
    );

    loop {
        println!("\n=== noblemtl-fetch ===");
        match get_user_input() {
            Ok(urls) => {
                for url in urls {
                    let start = Instant::now();
                    if let Err(e) = process(&downloader, &controller, &url).await {
                        error!("{} 处理失败: {:#}", url, e);
                        continue;
                    }
                    display_elapsed_time(start.elapsed());
                }
            }
            Err(e) => {
                println!("输入错误: {}", e);
            }
        }

        print!("\n是否继续下载其他小说? (y/n): ");
        io::stdout().flush()?;
        let mut continue_choice = String::new();
        io::stdin().read_line(&mut continue_choice)?;
        if continue_choice.trim().to_lowercase() != "y" {
            break;
        }
    }

    println!("程序结束。");
    Ok(())
}

async fn process(downloader: &Downloader, controller: &Controller, url: &str) -> Result<()> {
    let html = downloader.html(url).await?;
    let page = HtmlDocument::parse(&html, Some(url));

    let Some(trigger) = controller.mount(&page) else {
        info!("{} 不是小说目录页, 跳过", url);
        return Ok(());
    };

    match trigger.activate_and_report().await? {
        Outcome::Saved { filename, chapters } => {
            info!("已保存 {} ({} 章)", filename, chapters)
        }
        Outcome::Empty => info!("{} 没有章节", url),
        Outcome::Declined => info!("已取消"),
    }
    Ok(())
}
