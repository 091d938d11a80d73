//! 헤드리스 UI 요소
//!
//! 실제 렌더링 없이 뷰 생명주기만 표현합니다. 숨겨진 요소를 `show()`하면 `loaded`
//! 핸들러가, 보이는 요소를 `hide()`하면 `unloaded` 핸들러가 호출됩니다. 같은 상태로의
//! 전이는 아무 일도 하지 않습니다.
//!
//! 핸들러는 목록 잠금을 놓은 뒤 호출되므로 핸들러 안에서 자기 자신을 해제할 수 있습니다.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use crate::view_models::ViewModel;

/// 핸들러 해제용 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub type Handler = Arc<dyn Fn(&Element) + Send + Sync>;

#[derive(Default)]
struct HandlerList {
    entries: Mutex<Vec<(HandlerId, Handler)>>,
}

impl HandlerList {
    fn attach(&self, id: HandlerId, handler: Handler) {
        self.entries.lock().push((id, handler));
    }

    fn detach(&self, id: HandlerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    fn snapshot(&self) -> Vec<Handler> {
        self.entries.lock().iter().map(|(_, handler)| handler.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// 데이터 컨텍스트와 loaded/unloaded 이벤트를 가진 요소
pub struct Element {
    name: String,
    data_context: RwLock<Option<Arc<dyn ViewModel>>>,
    visible: AtomicBool,
    loaded: HandlerList,
    unloaded: HandlerList,
    next_handler: AtomicU64,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_context: RwLock::new(None),
            visible: AtomicBool::new(false),
            loaded: HandlerList::default(),
            unloaded: HandlerList::default(),
            next_handler: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_context(&self) -> Option<Arc<dyn ViewModel>> {
        self.data_context.read().clone()
    }

    pub fn set_data_context(&self, vm: Option<Arc<dyn ViewModel>>) {
        *self.data_context.write() = vm;
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn on_loaded<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Element) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.loaded.attach(id, Arc::new(handler));
        id
    }

    pub fn on_unloaded<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Element) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.unloaded.attach(id, Arc::new(handler));
        id
    }

    pub fn detach_loaded(&self, id: HandlerId) -> bool {
        self.loaded.detach(id)
    }

    pub fn detach_unloaded(&self, id: HandlerId) -> bool {
        self.unloaded.detach(id)
    }

    /// (loaded, unloaded) 핸들러 수
    pub fn handler_counts(&self) -> (usize, usize) {
        (self.loaded.len(), self.unloaded.len())
    }

    /// 화면에 올립니다. 이미 보이는 상태면 `false`
    pub fn show(&self) -> bool {
        if self.visible.swap(true, Ordering::AcqRel) {
            return false;
        }
        for handler in self.loaded.snapshot() {
            handler(self);
        }
        true
    }

    /// 화면에서 내립니다. 이미 숨겨진 상태면 `false`
    pub fn hide(&self) -> bool {
        if !self.visible.swap(false, Ordering::AcqRel) {
            return false;
        }
        for handler in self.unloaded.snapshot() {
            handler(self);
        }
        true
    }

    fn next_id(&self) -> HandlerId {
        HandlerId(self.next_handler.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (loaded, unloaded) = self.handler_counts();
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("visible", &self.is_visible())
            .field("has_data_context", &self.data_context.read().is_some())
            .field("loaded_handlers", &loaded)
            .field("unloaded_handlers", &unloaded)
            .finish()
    }
}
