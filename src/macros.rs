pub use enclose::*;

/// Builds a [`Computed`](crate::Computed). The body may use `?` and its
/// result is converted into a [`Value`](crate::Value).
///
/// ```ignore
/// let total = computed!("total", (cart) => cart.get("price").as_number().unwrap_or(0.0) * 2.0);
/// ```
#[macro_export]
macro_rules! computed {
    ($name:expr, ( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::Computed::new($name, $crate::macros::enclose!(($( $d_tt )*) move || -> $crate::anyhow::Result<$crate::Value> {
            Ok($crate::Value::from({ $($b)* }))
        }))
    };
    ($name:expr => $($b:tt)*) => {
        $crate::Computed::new($name, move || -> $crate::anyhow::Result<$crate::Value> {
            Ok($crate::Value::from({ $($b)* }))
        })
    };
}

/// Builds an eager, non-user [`Watcher`](crate::Watcher) that runs the
/// body now and again after every change of what it read.
#[macro_export]
macro_rules! render {
    ($name:expr, ( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::Watcher::new(
            $crate::Evaluator::new($crate::macros::enclose!(($( $d_tt )*) move || -> $crate::anyhow::Result<$crate::Value> {
                Ok($crate::Value::from({ $($b)* }))
            }))
            .named($name),
            None,
            ::std::default::Default::default(),
        )
    };
    ($name:expr => $($b:tt)*) => {
        $crate::Watcher::new(
            $crate::Evaluator::new(move || -> $crate::anyhow::Result<$crate::Value> {
                Ok($crate::Value::from({ $($b)* }))
            })
            .named($name),
            None,
            ::std::default::Default::default(),
        )
    };
}
