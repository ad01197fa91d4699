//! Counter feature: state, actions, reducer, selectors and the fetch effect

use futures::StreamExt;
use futures::future::ready;
use serde::{Deserialize, Serialize};
use statehouse::{
    ActionStream, ActionTemplate, AnonymousAction, Effect, EffectContext, ReduceOn, RuleReducer,
    Selector,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CounterState {
    pub counter: i64,
    pub loading: bool,
    pub fetched: Option<i64>,
}

pub static INCREMENT: ActionTemplate<i64> = ActionTemplate::with_payload("Increment");
pub static FETCH: ActionTemplate = ActionTemplate::new("Fetch");
pub static FETCH_SUCCEEDED: ActionTemplate<i64> = ActionTemplate::with_payload("FetchSucceeded");

pub fn reducer() -> RuleReducer<CounterState, AnonymousAction> {
    RuleReducer::new()
        .on(ReduceOn::template(&INCREMENT, |mut state: CounterState, n| {
            state.counter += n;
            state
        }))
        .on(ReduceOn::template(&FETCH, |mut state: CounterState, ()| {
            state.loading = true;
            state
        }))
        .on(ReduceOn::template(
            &FETCH_SUCCEEDED,
            |mut state: CounterState, value| {
                state.loading = false;
                state.fetched = Some(value);
                state.counter += value;
                state
            },
        ))
}

pub fn double_counter() -> Selector<CounterState, i64> {
    Selector::new(|state: &CounterState| state.counter * 2)
}

/// Status line derived from the counter and the fetch state
pub fn status(counter: &Selector<CounterState, i64>) -> Selector<CounterState, String> {
    let loading = Selector::new(|state: &CounterState| state.loading);
    Selector::compose2(counter, &loading, |double, loading| {
        if *loading {
            format!("double={double} (fetching)")
        } else {
            format!("double={double}")
        }
    })
}

/// Simulated remote fetch: answers every `Fetch` with the current counter
pub fn effects(ctx: &EffectContext<CounterState, AnonymousAction>) -> Vec<Effect<AnonymousAction>> {
    let state = ctx.state().clone();
    vec![
        Effect::dispatching_one(move |actions: ActionStream<AnonymousAction>| {
            actions
                .filter(|action| ready(FETCH.matches(action)))
                .then(move |_| {
                    let current = state.project(|s| s.counter);
                    async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        FETCH_SUCCEEDED.create_with(current)
                    }
                })
        })
        .named("fetch"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use statehouse::Store;

    #[tokio::test]
    async fn test_fetch_adds_the_counter_again() {
        let mut store = Store::new(CounterState::default()).with_reducer(reducer());
        store.register_effects(effects).unwrap();
        let running = store.spawn().unwrap();
        let handle = running.handle().clone();

        handle.dispatch(INCREMENT.create_with(21));
        handle.dispatch(FETCH.create());

        let mut fetched = handle.select(&Selector::new(|s: &CounterState| s.fetched));
        while fetched.next().await != Some(Some(21)) {}

        let store = running.stop().await.unwrap();
        assert_eq!(store.state().counter, 42);
        assert!(!store.state().loading);
    }

    #[test]
    fn test_status_reflects_loading() {
        let mut store = Store::new(CounterState::default()).with_reducer(reducer());
        let status = status(&double_counter());

        store.dispatch(INCREMENT.create_with(4));
        assert_eq!(store.select_current(&status), "double=8");
        store.dispatch(FETCH.create());
        assert_eq!(store.select_current(&status), "double=8 (fetching)");
    }
}
