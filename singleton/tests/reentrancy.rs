mod common;
use common::Log;
use singleton_hook::*;
use std::sync::{Arc, Mutex};

/// Singleton whose computation hands its setter out for the test to drive
fn driven(options: SingletonOptions) -> (Singleton<u32>, Arc<Mutex<Option<Setter<u32>>>>) {
    let setter = Arc::new(Mutex::new(None));
    let singleton = {
        let setter = setter.clone();
        Singleton::with_options(
            0,
            move |scope: &Scope<u32>| {
                *setter.lock().unwrap() = Some(scope.setter());
            },
            options,
        )
    };
    (singleton, setter)
}

fn take_setter(slot: &Arc<Mutex<Option<Setter<u32>>>>) -> Setter<u32> { slot.lock().unwrap().clone().unwrap() }

#[test]
fn test_detach_self_during_broadcast() {
    let (singleton, slot) = driven(SingletonOptions::default());
    let log = Log::new();
    let own_id = Arc::new(Mutex::new(None::<SubscriberId>));

    let _first = singleton.attach(log.listener("first")).unwrap();
    let quitter = {
        let log = log.clone();
        let handle = singleton.clone();
        let own_id = own_id.clone();
        singleton.attach(move |value: u32| {
            log.push(format!("quitter:{value}"));
            if value == 1 {
                let id = own_id.lock().unwrap().take();
                if let Some(id) = id {
                    handle.detach(id);
                }
            }
        })
    }
    .unwrap();
    *own_id.lock().unwrap() = Some(quitter);
    let _last = singleton.attach(log.listener("last")).unwrap();
    log.take();

    let setter = take_setter(&slot);
    setter.set(1);
    // the detach is not visible to the pass already underway
    assert_eq!(log.take(), ["first:1", "quitter:1", "last:1"]);
    assert_eq!(singleton.subscriber_count(), 2);

    setter.set(2);
    assert_eq!(log.take(), ["first:2", "last:2"]);
}

#[test]
fn test_attach_during_broadcast_gets_current_value_once() {
    let (singleton, slot) = driven(SingletonOptions::default());
    let log = Log::new();
    let late = Arc::new(Mutex::new(Vec::new()));

    let _recruiter = {
        let log = log.clone();
        let handle = singleton.clone();
        let late = late.clone();
        singleton.attach(move |value: u32| {
            log.push(format!("recruiter:{value}"));
            if value == 1 {
                let id = handle.attach(log.listener("late")).unwrap();
                late.lock().unwrap().push(id);
            }
        })
    }
    .unwrap();
    let _after = singleton.attach(log.listener("after")).unwrap();
    log.take();

    let setter = take_setter(&slot);
    setter.set(1);
    // the newcomer sees 1 as its mount value, not as part of the broadcast
    assert_eq!(log.take(), ["recruiter:1", "late:1", "after:1"]);
    assert_eq!(singleton.subscriber_count(), 3);

    setter.set(2);
    assert_eq!(log.take(), ["recruiter:2", "after:2", "late:2"]);
}

#[test]
fn test_write_from_listener() {
    let (singleton, slot) = driven(SingletonOptions::default());
    let log = Log::new();

    let _echo = {
        let log = log.clone();
        let slot = slot.clone();
        singleton.attach(move |value: u32| {
            log.push(format!("echo:{value}"));
            if value == 1 {
                take_setter(&slot).set(10);
            }
        })
    }
    .unwrap();
    let _other = singleton.attach(log.listener("other")).unwrap();
    log.take();

    take_setter(&slot).set(1);
    // the nested write completes its own broadcast before the outer one resumes
    assert_eq!(log.take(), ["echo:1", "echo:10", "other:10", "other:1"]);
    assert_eq!(singleton.get(), 10);
}

#[test]
fn test_attach_inside_mount_delivery_shares_activation() {
    let log = Log::new();
    let singleton = Singleton::new(0u32, |scope: &Scope<u32>| {
        scope.set(5);
    });

    let nested = Arc::new(Mutex::new(Vec::new()));
    let _outer = {
        let log = log.clone();
        let handle = singleton.clone();
        let nested = nested.clone();
        singleton.attach(move |value: u32| {
            log.push(format!("outer:{value}"));
            let mut nested = nested.lock().unwrap();
            if nested.is_empty() {
                nested.push(handle.attach(log.listener("inner")).unwrap());
            }
        })
    }
    .unwrap();

    // the nested consumer joins before the computation starts and sees its first write
    assert_eq!(log.take(), ["outer:0", "inner:0", "outer:5", "inner:5"]);
    assert_eq!(singleton.activations(), 1);
    assert_eq!(singleton.subscriber_count(), 2);
}

#[test]
fn test_dispose_inside_mount_delivery_skips_computation() {
    let started = Arc::new(Mutex::new(false));
    let singleton = {
        let started = started.clone();
        Singleton::new(0u32, move |_: &Scope<u32>| *started.lock().unwrap() = true)
    };

    let result = {
        let handle = singleton.clone();
        singleton.attach(move |_: u32| handle.dispose())
    };

    assert!(result.is_ok());
    assert!(!*started.lock().unwrap());
    assert!(singleton.is_disposed());
    assert_eq!(singleton.activation_state(), ActivationState::Inactive);
}

#[test]
fn test_detach_listener_owning_subscription() {
    let singleton = Singleton::new(0u32, |_: &Scope<u32>| {});
    let owned = singleton.subscribe(|_: u32| {}).unwrap();
    let owner = singleton
        .attach(move |_: u32| {
            let _held = &owned;
        })
        .unwrap();
    assert_eq!(singleton.subscriber_count(), 2);

    // dropping the owner's listener drops the subscription, which detaches re-entrantly
    assert!(singleton.detach(owner));
    assert_eq!(singleton.subscriber_count(), 0);
}

#[test]
fn test_dispose_with_listener_owning_subscription() {
    let singleton = Singleton::new(0u32, |_: &Scope<u32>| {});
    let owned = singleton.subscribe(|_: u32| {}).unwrap();
    singleton
        .attach(move |_: u32| {
            let _held = &owned;
        })
        .unwrap();

    singleton.dispose();
    assert!(singleton.is_disposed());
    assert_eq!(singleton.subscriber_count(), 0);
}

/// Value type that can hold a subscription to the singleton storing it
#[derive(Clone, Default)]
struct Held(Option<Arc<Subscription<Held>>>);

#[test]
fn test_replaced_value_owning_subscription() {
    let slot = Arc::new(Mutex::new(None));
    let singleton = {
        let slot = slot.clone();
        Singleton::new(Held::default(), move |scope: &Scope<Held>| {
            *slot.lock().unwrap() = Some(scope.setter());
        })
    };
    let _keeper = singleton.subscribe(|_: Held| {}).unwrap();
    let setter = slot.lock().unwrap().clone().unwrap();

    let subscription = singleton.subscribe(|_: Held| {}).unwrap();
    assert!(setter.set(Held(Some(Arc::new(subscription)))));
    assert_eq!(singleton.subscriber_count(), 2);

    // overwriting releases the last reference to the stored subscription
    assert!(setter.set(Held::default()));
    assert_eq!(singleton.subscriber_count(), 1);
}
