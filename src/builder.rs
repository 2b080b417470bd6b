/// A builder macro that creates a `HamtMap` from a list of key-value pairs.
///
/// # Examples
///
/// ```
/// use hamt_map::hamt;
///
/// let dict = hamt! {
///  "one" : 1,
///  "two" : 2,
///  "three": 3,
/// };
///
/// assert_eq!(dict.len(), 3);
///
/// assert_eq!(dict.get(&"one"), Some(1));
/// assert_eq!(dict.get(&"two"), Some(2));
/// assert_eq!(dict.get(&"three"), Some(3));
/// ```
#[macro_export]
macro_rules! hamt {
    // Empty pattern.
    () => {
        $crate::HamtMap::new()
    };
    ( $( $key:tt : $value:expr ),* $(,)? ) => {
        {
            use $crate::HamtMap;

            let mut map = HamtMap::new();
            $(
                map.insert($key, $value);
            )*
            map
        }
    };
    // Catch-all pattern for invalid patterns.
    ( $($tt:tt)* ) => {
        compile_error!("Invalid syntax. Use `hamt! { key: value, ... }`.");
    };
}
