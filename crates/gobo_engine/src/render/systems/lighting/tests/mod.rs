//! Cross-module tests for the projected-texture spotlight system

mod frame;

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::{AssetError, TextureLoadEvent, TextureLoader, TextureRequest};
use crate::render::texture::{ColorSpace, Texture};

#[derive(Default)]
struct ScriptState {
    requests: Vec<TextureRequest>,
    completed: Vec<TextureLoadEvent>,
}

/// Loader whose loads complete only when a test says so, in any order
#[derive(Clone, Default)]
pub(crate) struct ScriptedLoader {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedLoader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.state
            .borrow()
            .requests
            .iter()
            .map(|request| request.source.clone())
            .collect()
    }

    /// Finish the oldest outstanding request for `source` with a solid texture
    pub(crate) fn complete(&self, source: &str, rgba: [u8; 4]) {
        let mut state = self.state.borrow_mut();
        let index = state
            .requests
            .iter()
            .position(|request| request.source == source)
            .unwrap();
        let request = state.requests.remove(index);
        let texture = Texture::from_rgba8(1, 1, &rgba, request.options.color_space)
            .unwrap()
            .with_name(source);
        state.completed.push(TextureLoadEvent {
            light: request.light,
            source: request.source,
            result: Ok(texture),
        });
    }

    pub(crate) fn fail(&self, source: &str) {
        let mut state = self.state.borrow_mut();
        let index = state
            .requests
            .iter()
            .position(|request| request.source == source)
            .unwrap();
        let request = state.requests.remove(index);
        state.completed.push(TextureLoadEvent {
            light: request.light,
            source: request.source.clone(),
            result: Err(AssetError::NotFound(request.source)),
        });
    }
}

impl TextureLoader for ScriptedLoader {
    fn load(&mut self, request: TextureRequest) {
        self.state.borrow_mut().requests.push(request);
    }

    fn drain_completed(&mut self) -> Vec<TextureLoadEvent> {
        std::mem::take(&mut self.state.borrow_mut().completed)
    }
}

#[test]
fn test_scripted_loader_completes_out_of_order() {
    use slotmap::SlotMap;
    let mut ids: SlotMap<crate::scene::ObjectId, ()> = SlotMap::with_key();
    let light = ids.insert(());

    let mut loader = ScriptedLoader::new();
    for source in ["a", "b"] {
        loader.load(TextureRequest {
            light,
            source: source.to_string(),
            options: Default::default(),
        });
    }
    loader.complete("b", [0, 0, 0, 255]);
    let events = loader.drain_completed();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].source, "b");
    assert_eq!(loader.requested(), vec!["a".to_string()]);
    assert_eq!(
        events[0].result.as_ref().unwrap().color_space(),
        ColorSpace::Srgb
    );
}
