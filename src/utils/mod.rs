pub mod docx;
pub mod media;

#[cfg(test)]
pub(crate) mod test_http;
