//! Typed factories creating registered graphics

use super::payload::{Animation, Bitmap, ExternalLink, GfxLink, Metafile, VectorGraphicData};
use super::{Graphic, GraphicImpl, GraphicState};
use crate::manager::{CacheManager, Registration};
use gfxswap_core::Result;
use std::sync::Arc;

impl CacheManager {
    /// Construct and register a graphic; every factory funnels through here
    fn new_graphic(&self, state: GraphicState) -> Graphic {
        let id = self.allocate_id();
        let inner = Arc::new(GraphicImpl::new(id, self.downgrade(), state));
        self.register_as(id, inner.clone());

        let registration = Registration::new(id, self.clone());
        Graphic {
            inner,
            registration: Arc::new(registration),
        }
    }

    /// Graphic without a payload
    pub fn new_empty(&self) -> Graphic {
        self.new_graphic(GraphicState::empty())
    }

    /// Graphic prepared from encoded link data, materialised on first use
    pub fn new_from_link(&self, link: GfxLink, page_index: Option<i32>) -> Graphic {
        self.new_graphic(GraphicState::prepared(link, page_index))
    }

    pub fn new_bitmap(&self, bitmap: Bitmap) -> Graphic {
        self.new_graphic(GraphicState::with_payload(bitmap.into()))
    }

    pub fn new_animation(&self, animation: Animation) -> Graphic {
        self.new_graphic(GraphicState::with_payload(animation.into()))
    }

    pub fn new_vector(&self, vector: VectorGraphicData) -> Graphic {
        self.new_graphic(GraphicState::with_payload(vector.into()))
    }

    pub fn new_metafile(&self, metafile: Metafile) -> Graphic {
        self.new_graphic(GraphicState::with_payload(metafile.into()))
    }

    pub fn new_external_link(&self, link: ExternalLink) -> Graphic {
        self.new_graphic(GraphicState::with_external_link(link))
    }

    /// Deep copy of `source`, registered as a new graphic
    ///
    /// A swapped-out source is read from its swap file without being swapped
    /// in; a prepared source stays prepared in the copy.
    pub fn copy(&self, source: &Graphic) -> Result<Graphic> {
        let state = source.inner.duplicate_state()?;
        Ok(self.new_graphic(state))
    }
}
