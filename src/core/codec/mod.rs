mod entry_id_codec;
mod errors;

pub use entry_id_codec::*;
pub use errors::CodecError;
