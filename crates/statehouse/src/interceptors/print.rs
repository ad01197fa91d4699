//! PrintInterceptor - writes every transition as text to a sink

use crate::action::Action;
use crate::codec;
use crate::interceptor::Interceptor;
use serde::Serialize;
use serde_json::{Map, Value};

/// Writes `(action, old state, new state)` as deterministic JSON to a sink
///
/// The sink is an opaque `FnMut(&str)`; use [`PrintInterceptor::stdout`] to
/// print. Parts that cannot be encoded are left out of the line instead of
/// failing the dispatch.
pub struct PrintInterceptor<F> {
    sink: F,
}

impl<F> PrintInterceptor<F>
where
    F: FnMut(&str) + Send,
{
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl PrintInterceptor<fn(&str)> {
    /// Interceptor printing to stdout
    pub fn stdout() -> Self {
        Self::new(|line| println!("{line}"))
    }
}

/// Render one transition as `<name> <json>`
pub fn render<S, A>(action: &A, old: &S, new: &S) -> String
where
    S: Serialize,
    A: Action + Serialize,
{
    let mut record = Map::new();
    for (key, part) in [
        ("action", codec::to_value(action)),
        ("old", codec::to_value(old)),
        ("new", codec::to_value(new)),
    ] {
        if let Some(part) = part {
            record.insert(key.to_string(), part);
        }
    }

    match codec::encode(&Value::Object(record)) {
        Some(text) => format!("{} {}", action.name(), text),
        None => action.name().into_owned(),
    }
}

impl<S, A, F> Interceptor<S, A> for PrintInterceptor<F>
where
    S: Serialize,
    A: Action + Serialize,
    F: FnMut(&str) + Send,
{
    fn on_dispatch(&mut self, action: &A, old: &S, new: &S) {
        let line = render(action, old, new);
        (self.sink)(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ActionTemplate;
    use serde::ser::Error as _;
    use std::sync::{Arc, Mutex};

    #[derive(Serialize)]
    struct Counter {
        counter: i64,
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not encodable"))
        }
    }

    static INCREMENT: ActionTemplate<i64> = ActionTemplate::with_payload("Increment");

    #[test]
    fn test_print_interceptor_writes_sorted_json() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let mut interceptor =
            PrintInterceptor::new(move |line: &str| sink.lock().unwrap().push(line.to_string()));

        interceptor.on_dispatch(
            &INCREMENT.create_with(5),
            &Counter { counter: 0 },
            &Counter { counter: 5 },
        );

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                r#"Increment {"action":{"id":"Increment","payload":5},"new":{"counter":5},"old":{"counter":0}}"#
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_encoding_failure_omits_payload() {
        let line = render(&INCREMENT.create_with(1), &Unencodable, &Unencodable);
        assert_eq!(line, r#"Increment {"action":{"id":"Increment","payload":1}}"#);
    }
}
