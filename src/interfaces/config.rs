use crate::domain::request::DropInRequest;
use crate::error::Result;
use std::io::Read;
use std::path::Path;

/// Supplies the request configuration for one flow instance.
///
/// Missing fields fall back to `DropInRequest::default()`.
pub fn load_request<R: Read>(source: R) -> Result<DropInRequest> {
    Ok(serde_json::from_reader(source)?)
}

pub fn load_request_file<P: AsRef<Path>>(path: P) -> Result<DropInRequest> {
    let file = std::fs::File::open(path)?;
    load_request(std::io::BufReader::new(file))
}
