pub mod ids;
pub mod test_utils;
