//! Data models exchanged between the browser console and the three backends.
//!
//! These are transcoding records, not persisted entities: the SOAP service
//! owns todos, the object store owns buckets and objects, and the gateway
//! only keeps the bounded socket message history in memory.

pub mod bucket;
pub mod message;
pub mod object;
pub mod todo;
