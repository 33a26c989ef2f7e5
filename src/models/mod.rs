//! Data carried through a single relay call.
//!
//! Nothing here outlives the request that created it: an upload is read into
//! memory, wrapped into a `RelayRequest`, and resolved into exactly one
//! `RelayResult` that becomes the response.

pub mod relay;
pub mod upload;
