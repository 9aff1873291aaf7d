//! Сквозной сценарий "последний открытый закрывается первым": машина
//! состояний, escape-стек и шина работают поверх одного реестра.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tocsin::{Action, StateMachine, StateSpec, TopicRegistry};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Хост открывает модальное окно и выпадающее меню; каждый Escape
/// закрывает последнее открытое, а когда ничего не открыто — срабатывает
/// действие по умолчанию (сброс фокуса на стороне хоста).
#[test]
fn test_escape_closes_last_opened_then_falls_back() {
    init_tracing();
    let registry = Arc::new(TopicRegistry::new());
    let machine = StateMachine::new(registry.clone());
    let stack = machine.escape_stack().clone();

    let focus_resets = Arc::new(AtomicUsize::new(0));
    let f = focus_resets.clone();
    stack.set_default_action(move || {
        f.fetch_add(1, Ordering::Relaxed);
    });

    let closed = Arc::new(Mutex::new(Vec::new()));
    for unit in ["modal", "dropdown"] {
        let closed = closed.clone();
        registry.subscribe(format!("{unit}:close").as_str(), move |_| {
            closed.lock().push(unit);
        });
    }

    // модал открыт первым, меню — поверх него
    stack.open("modal", Action::topic("modal:close"), Value::Null, None);
    stack.open("dropdown", Action::topic("dropdown:close"), Value::Null, None);

    stack.execute(None); // Escape #1
    assert_eq!(*closed.lock(), vec!["dropdown"]);

    stack.execute(None); // Escape #2
    assert_eq!(*closed.lock(), vec!["dropdown", "modal"]);
    assert_eq!(focus_resets.load(Ordering::Relaxed), 0);

    stack.execute(None); // Escape #3: всё закрыто
    assert_eq!(focus_resets.load(Ordering::Relaxed), 1);
}

/// Закрытие по Escape гонит действие через шину, и переход состояния
/// модуля виден подписчику префикса модуля.
#[test]
fn test_escape_drives_state_transition() {
    init_tracing();
    let registry = Arc::new(TopicRegistry::new());
    let machine = Arc::new(StateMachine::new(registry.clone()));
    let stack = machine.escape_stack().clone();

    machine.register_module(
        "panel",
        vec![StateSpec::new("open"), StateSpec::new("hidden")],
        Some("open"),
    );

    // обработчик темы закрытия переводит модуль в hidden
    let m = machine.clone();
    registry.subscribe("panel:close", move |data| {
        m.change_state("panel", "hidden", Some(data));
    });

    // уведомления: точная тема перехода и префикс модуля; префикс видит
    // и каскад от самого panel:close, и каскад от panel:hidden
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();
    registry.subscribe("panel:hidden", move |_| l.lock().push("hidden.exact"));
    let l = log.clone();
    registry.subscribe("panel", move |_| l.lock().push("module.prefix"));

    stack.open("panel", Action::topic("panel:close"), json!({"via": "esc"}), None);
    stack.execute(None);

    assert_eq!(machine.current_state("panel"), Some("hidden".to_string()));
    assert_eq!(
        *log.lock(),
        vec!["hidden.exact", "module.prefix", "module.prefix"]
    );
    assert_eq!(stack.live_count(), 0);
}

/// Отмена без запуска: `cancel` убирает запись, последующий Escape
/// уходит в действие по умолчанию, а не в отменённую запись.
#[test]
fn test_cancel_leaves_default_path() {
    init_tracing();
    let registry = Arc::new(TopicRegistry::new());
    let machine = StateMachine::new(registry.clone());
    let stack = machine.escape_stack().clone();

    let fallback = Arc::new(AtomicUsize::new(0));
    let f = fallback.clone();
    stack.set_default_action(move || {
        f.fetch_add(1, Ordering::Relaxed);
    });

    let closes = Arc::new(AtomicUsize::new(0));
    let c = closes.clone();
    registry.subscribe("sheet:close", move |_| {
        c.fetch_add(1, Ordering::Relaxed);
    });

    stack.open("sheet", Action::topic("sheet:close"), Value::Null, None);
    stack.cancel("sheet");
    stack.execute(None);

    assert_eq!(closes.load(Ordering::Relaxed), 0);
    assert_eq!(fallback.load(Ordering::Relaxed), 1);
}

/// Подписчик закрытия может открыть следующую единицу работы прямо из
/// callback-а: стек и шина терпимы к повторному входу.
#[test]
fn test_reentrant_open_from_close_handler() {
    init_tracing();
    let registry = Arc::new(TopicRegistry::new());
    let machine = StateMachine::new(registry.clone());
    let stack = machine.escape_stack().clone();

    let confirm_closes = Arc::new(AtomicUsize::new(0));
    let c = confirm_closes.clone();
    registry.subscribe("confirm:close", move |_| {
        c.fetch_add(1, Ordering::Relaxed);
    });

    // закрытие визарда открывает подтверждение
    let s = stack.clone();
    registry.subscribe("wizard:close", move |_| {
        s.open("confirm", Action::topic("confirm:close"), Value::Null, None);
    });

    stack.open("wizard", Action::topic("wizard:close"), Value::Null, None);
    stack.execute(None);
    assert_eq!(stack.live_count(), 1, "подтверждение открыто");

    stack.execute(None);
    assert_eq!(confirm_closes.load(Ordering::Relaxed), 1);
    assert_eq!(stack.live_count(), 0);
}
