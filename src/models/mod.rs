/// Implements [`Document`] for an entity with `id: String` stored in `collection`.
macro_rules! impl_document {
    ($ty:ty, $collection:expr) => {
        impl $crate::models::Document for $ty {
            const COLLECTION: $crate::models::Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

pub mod blog;
pub mod collection;
pub mod job;
pub mod media;
pub mod page;
pub mod profile;
pub mod reference;
pub mod skill;
pub mod tag;
pub mod tour;

pub use blog::*;
pub use collection::*;
pub use job::*;
pub use media::*;
pub use page::*;
pub use profile::*;
pub use reference::*;
pub use skill::*;
pub use tag::*;
pub use tour::*;
