//! 绕过站点的复制保护
//!
//! 在捕获阶段拦截下列交互事件并阻止其继续传播, 页面自己的监听器因此收不到这些事件。

use std::collections::HashMap;

use tracing::debug;

pub const PREVENTED_EVENTS: [&str; 6] = [
    // 选择和复制文本 (桌面与移动端)
    "mousedown",
    "selectstart",
    "touchstart",
    "touchend",
    "keydown",
    // 右键菜单里的复制
    "contextmenu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

pub type Listener = Box<dyn Fn(&str) -> Propagation + Send + Sync>;

/// 可以挂载捕获阶段监听器的事件目标
pub trait EventTarget {
    fn add_capture_listener(&mut self, event: &str, listener: Listener) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

#[must_use = "丢弃后无法再卸载"]
pub struct InteractionShield {
    listeners: Vec<ListenerId>,
}

impl InteractionShield {
    pub fn install(target: &mut impl EventTarget) -> Self {
        let listeners = PREVENTED_EVENTS
            .iter()
            .map(|event| target.add_capture_listener(event, Box::new(|_: &str| Propagation::Stop)))
            .collect();
        debug!("已拦截 {} 种交互事件", PREVENTED_EVENTS.len());
        Self { listeners }
    }

    pub fn uninstall(self, target: &mut impl EventTarget) {
        for id in self.listeners {
            target.remove_listener(id);
        }
    }
}

/// 进程内的事件表, 命令行宿主用它代替浏览器的 document
#[derive(Default)]
pub struct PageEvents {
    next_id: u64,
    capture: HashMap<String, Vec<(ListenerId, Listener)>>,
    bubble: HashMap<String, Vec<(ListenerId, Listener)>>,
}

impl PageEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bubble_listener(&mut self, event: &str, listener: Listener) -> ListenerId {
        let id = self.next_id();
        self.bubble
            .entry(event.to_owned())
            .or_default()
            .push((id, listener));
        id
    }

    /// 先走捕获阶段再走冒泡阶段, 返回实际被调用的监听器个数
    pub fn dispatch(&self, event: &str) -> usize {
        let mut invoked = 0;
        let phases = [self.capture.get(event), self.bubble.get(event)];
        for listeners in phases.into_iter().flatten() {
            for (_, listener) in listeners {
                invoked += 1;
                if listener(event) == Propagation::Stop {
                    return invoked;
                }
            }
        }
        invoked
    }

    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

impl EventTarget for PageEvents {
    fn add_capture_listener(&mut self, event: &str, listener: Listener) -> ListenerId {
        let id = self.next_id();
        self.capture
            .entry(event.to_owned())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        for listeners in self.capture.values_mut().chain(self.bubble.values_mut()) {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }
}
