use std::fmt;

/// Events emitted by a [`SingletonMap`](crate::SingletonMap) while serving requests.
///
/// These events are passed to the callback set via
/// [`SingletonMap::set_trace_callback`](crate::SingletonMap::set_trace_callback).
/// They borrow the key from the request, so a callback that wants to keep them
/// should render them first.
///
/// # Examples
///
/// ```rust
/// use service_locator::SingletonEvent;
///
/// let event = SingletonEvent::Construct { key: &"db", type_name: "u32" };
/// assert_eq!(event.to_string(), "construct { key: \"db\", type_name: u32 }");
/// ```
#[derive(Debug, Clone, Copy)]
pub enum SingletonEvent<'a, K> {
    /// The calling thread claimed the key and is about to run the factory.
    Construct {
        /// The key being constructed.
        key: &'a K,
        /// The type the factory produces.
        type_name: &'static str,
    },

    /// The factory finished and its value is now memoized.
    Ready {
        /// The key that became ready.
        key: &'a K,
        /// The type the factory produced.
        type_name: &'static str,
    },

    /// The factory returned an error or panicked, and the key went back to empty.
    Failed {
        /// The key whose construction failed.
        key: &'a K,
        /// The type the factory was asked to produce.
        type_name: &'static str,
    },

    /// A memoized value was handed out.
    Get {
        /// The requested key.
        key: &'a K,
        /// The requested type.
        type_name: &'static str,
        /// Whether the caller had to wait for another thread's factory.
        waited: bool,
    },
}

impl<K: fmt::Debug> fmt::Display for SingletonEvent<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonEvent::Construct { key, type_name } => {
                write!(f, "construct {{ key: {key:?}, type_name: {type_name} }}")
            }
            SingletonEvent::Ready { key, type_name } => {
                write!(f, "ready {{ key: {key:?}, type_name: {type_name} }}")
            }
            SingletonEvent::Failed { key, type_name } => {
                write!(f, "failed {{ key: {key:?}, type_name: {type_name} }}")
            }
            SingletonEvent::Get {
                key,
                type_name,
                waited,
            } => write!(
                f,
                "get {{ key: {key:?}, type_name: {type_name}, waited: {waited} }}"
            ),
        }
    }
}
