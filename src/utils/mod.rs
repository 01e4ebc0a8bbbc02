pub mod clock;
pub mod input_validation;
pub mod password_utils;
