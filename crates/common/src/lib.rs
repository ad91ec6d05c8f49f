pub mod error;
pub mod object_id;

pub use error::{Error, Result};
pub use object_id::{DocumentId, IdCodec, ObjectId, ObjectIdCodec};
