//! Последовательная очередь именованных задач.
//!
//! Очередь не взаимодействует ни с шиной, ни со стеком действий: это
//! отдельный строго последовательный планировщик. Задача регистрируется
//! один раз под именем, в очередь ставятся только зарегистрированные
//! имена, выполнение идёт по одной задаче за вызов.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

/// Тело задачи: получает параметры, записанные при регистрации.
pub type TaskFn = dyn Fn(Option<&Value>) + Send + Sync;

#[derive(Clone)]
struct Task {
    run: Arc<TaskFn>,
    params: Option<Value>,
}

#[derive(Default)]
struct QueueInner {
    /// Имена задач в порядке постановки; одно имя может стоять несколько раз.
    order: Vec<String>,
    tasks: HashMap<String, Task>,
}

/// Последовательная очередь именованных задач.
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Регистрирует (или перезаписывает) задачу под именем.
    pub fn add_task(
        &self,
        name: &str,
        f: impl Fn(Option<&Value>) + Send + Sync + 'static,
        params: Option<Value>,
    ) -> &Self {
        self.inner.lock().tasks.insert(
            name.to_string(),
            Task {
                run: Arc::new(f),
                params,
            },
        );
        self
    }

    /// Удаляет регистрацию задачи и все её вхождения в очередь.
    pub fn remove_task(&self, name: &str) -> &Self {
        let mut inner = self.inner.lock();
        inner.tasks.remove(name);
        inner.order.retain(|queued| queued != name);
        self
    }

    /// Ставит задачу в хвост очереди. Незарегистрированные имена
    /// игнорируются.
    pub fn enqueue(&self, name: &str) -> &Self {
        let mut inner = self.inner.lock();
        if inner.tasks.contains_key(name) {
            inner.order.push(name.to_string());
        } else {
            trace!(task = name, "enqueue of unknown task ignored");
        }
        self
    }

    /// Убирает первое вхождение имени из очереди.
    pub fn dequeue(&self, name: &str) -> &Self {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.order.iter().position(|queued| queued == name) {
            inner.order.remove(pos);
        }
        self
    }

    /// Убирает последнее вхождение имени из очереди.
    pub fn dequeue_last(&self, name: &str) -> &Self {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.order.iter().rposition(|queued| queued == name) {
            inner.order.remove(pos);
        }
        self
    }

    /// Снимает голову очереди и синхронно выполняет её.
    ///
    /// Возвращает `true`, если задача была выполнена. Имена, чья
    /// регистрация исчезла между постановкой и запуском, пропускаются.
    pub fn run_next(&self) -> bool {
        loop {
            let task = {
                let mut inner = self.inner.lock();
                if inner.order.is_empty() {
                    return false;
                }
                let name = inner.order.remove(0);
                inner.tasks.get(&name).cloned()
            };
            if let Some(task) = task {
                (task.run)(task.params.as_ref());
                return true;
            }
        }
    }

    /// Выполняет задачи, пока очередь не опустеет. Возвращает число
    /// выполненных.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Длина очереди (включая повторные вхождения имён).
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
