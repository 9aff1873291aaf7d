//! Подсистема Publish–Subscribe с иерархией тем.
//!
//! Этот модуль реализует синхронную внутрипроцессную шину сообщений:
//!
//! - `topic`: разбор путей тем (разделители, префиксы-предки) и строковые
//!   помощники для wildcard-подписок.
//! - `channel`: именованный узел маршрутизации со слотовой таблицей
//!   подписчиков и списком предков.
//! - `registry`: реестр каналов — ленивое создание, подписки и алгоритм
//!   доставки с каскадом в префиксы.
//! - `intern` (приватный): пул interned-имён тем.
//!
//! Публичный API переэкспортирует:
//! - `topic::*`
//! - `channel::*`
//! - `registry::*`

pub mod channel;
mod intern;
pub mod registry;
pub mod topic;

pub use channel::{Channel, SubscriberFn, SubscriptionId};
pub(crate) use intern::intern_topic;
pub use registry::TopicRegistry;
pub use topic::{
    ancestor_paths, detect_delimiter, ends_with_wildcard, strip_wildcard, Delimiter,
};
