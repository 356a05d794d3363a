/*!
Shared state that many consumers observe while its computation runs only once.

A [`Singleton`] owns one value and one computation body. The body starts when the first
consumer attaches, and everything it writes through its [`Scope`] is broadcast to all
attached consumers. Further consumers share the running computation. When the last
consumer detaches the computation keeps running, unless
[`SingletonOptions::unmount_if_no_consumers`] asks for it to be stopped.

# Design requirements:
- One computation per activation period, no matter how many consumers attach
- Every consumer receives the current value as soon as it attaches
- Writes are delivered synchronously, in attachment order, before the write returns
- Consumers may attach, detach or write from inside their own callbacks
- Writes from a stopped computation are dropped, never queued
- No hidden global state: every constructor call is an independent instance

# Basic usage

```rust
use singleton_hook::*;
use std::sync::{Arc, Mutex};

let online = Singleton::with_options(
    false,
    |scope: &Scope<bool>| {
        scope.set(true);
        scope.on_cleanup(|| println!("connection closed"));
    },
    SingletonOptions::new().unmount_if_no_consumers(true),
);

let seen = Arc::new(Mutex::new(Vec::new()));
let first = {
    let seen = seen.clone();
    online.subscribe(move |value: bool| seen.lock().unwrap().push(value)).unwrap()
};
let second = online.subscribe(|_: bool| {}).unwrap();
assert_eq!(online.activations(), 1);
assert_eq!(*seen.lock().unwrap(), [false, true]);

drop(first);
drop(second);
assert_eq!(online.activation_state(), ActivationState::Inactive);
```

# Host integration

Hosts with their own component lifecycle call [`Singleton::attach`] when a consumer mounts
and [`Singleton::detach`] when it unmounts. [`Singleton::subscribe`] wraps the pair in a
guard that detaches on drop.
*/

mod activation;
mod broadcast;
mod cell;
mod error;
mod options;
pub mod porcelain;
mod registry;
mod scope;
mod singleton;
mod subscription;

pub use activation::ActivationState;
pub use cell::Initial;
pub use error::*;
pub use options::*;
pub use registry::{IntoListener, Listener, SubscriberId};
pub use scope::*;
pub use singleton::*;
pub use subscription::*;

#[cfg(feature = "tokio")]
pub use porcelain::*;
