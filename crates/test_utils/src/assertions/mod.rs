// Path: crates/test_utils/src/assertions/mod.rs
//! Assertion utilities for testing

/// Assert that two byte strings are equal, printing both as hex on failure.
#[macro_export]
macro_rules! assert_bytes_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left, right) => {
                let (left, right): (&[u8], &[u8]) = (left.as_ref(), right.as_ref());
                assert!(
                    left == right,
                    "bytes differ\n  left: 0x{}\n right: 0x{}",
                    $crate::hex::encode(left),
                    $crate::hex::encode(right)
                );
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left, right) => {
                let (left, right): (&[u8], &[u8]) = (left.as_ref(), right.as_ref());
                assert!(
                    left == right,
                    "bytes differ ({})\n  left: 0x{}\n right: 0x{}",
                    format!($($arg)+),
                    $crate::hex::encode(left),
                    $crate::hex::encode(right)
                );
            }
        }
    };
}

/// Assert that a result is OK and unwrap it
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok, got Err: {}", err),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok, got Err: {} ({})", err, format!($($arg)+)),
        }
    };
}

/// Assert that a result is Err and unwrap the error. With a pattern, the
/// error must also match it.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(err) => err,
        }
    };
    ($expr:expr, $pat:pat) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(err) => {
                assert!(
                    matches!(err, $pat),
                    "error {:?} does not match {}",
                    err,
                    stringify!($pat)
                );
                err
            }
        }
    };
}

/// Assert that a value is within an inclusive range
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $min:expr, $max:expr) => {
        assert!($value >= $min && $value <= $max, "{} not in range [{}, {}]", $value, $min, $max);
    };
    ($value:expr, $min:expr, $max:expr, $($arg:tt)+) => {
        assert!($value >= $min && $value <= $max, "{} not in range [{}, {}]: {}", $value, $min, $max, format!($($arg)+));
    };
}
