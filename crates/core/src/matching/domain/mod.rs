pub mod match_error;
pub mod match_result;
pub mod similarity;
pub mod window_matcher;
