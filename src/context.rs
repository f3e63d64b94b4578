//! Ticket context – the data handed to a ticket template.
//!
//! The context is built fresh for every render and never mutated afterwards.
//! There is no data source behind it yet: [`build_context`] always returns the
//! same synthetic ticket, and [`Fixture`] chooses between ordinary values and
//! deliberately pathological ones used to stress layout and pagination.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RenderError;

/// Top-level template context, keyed by field name.
pub type ContextMap = Map<String, Value>;

/// Everything a ticket template consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketContext {
    /// User-facing labels keyed by label name.
    pub i18n: BTreeMap<String, String>,
    pub route: Route,
    pub ticket: TicketNumbers,
    pub passenger: Passenger,
    pub payment: Payment,
    pub departure: Stop,
    pub arrival: Stop,
    pub timeline: Timeline,
    /// Inline QR image (`data:image/svg+xml;base64,...`).
    pub qr_data_uri: String,
    /// URL that reopens the ticket in the online client.
    pub deep_link: String,
    /// Pre-rendered markup, emitted unescaped by the templates.
    pub status_chip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub from: String,
    pub to: String,
    pub label: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketNumbers {
    pub number: String,
    pub order_number: String,
    pub seat: String,
    pub baggage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passenger {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub status: String,
    pub method: String,
    pub amount: String,
}

/// A departure or arrival point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub name: String,
    pub datetime: String,
    pub address: String,
    pub map_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub duration_text: String,
}

impl TicketContext {
    /// Serialise into the map form consumed by validation and templating.
    pub fn to_map(&self) -> Result<ContextMap, RenderError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RenderError::Template(format!(
                "ticket context serialised to a non-object value: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Status chip
// ---------------------------------------------------------------------------

/// Lifecycle state of a purchased ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Pending,
    Paid,
    Canceled,
}

impl TicketStatus {
    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Pending => "Ожидает оплаты",
            TicketStatus::Paid => "Оплачен",
            TicketStatus::Canceled => "Отменён",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            TicketStatus::Pending => "status-pending",
            TicketStatus::Paid => "status-paid",
            TicketStatus::Canceled => "status-canceled",
        }
    }

    /// Small markup fragment shown next to the ticket title.
    pub fn status_chip(self) -> String {
        format!(
            "<span class='status-chip {}'>{}</span>",
            self.css_class(),
            tera::escape_html(self.label())
        )
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Which set of synthetic values to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Fixture {
    /// Short, realistic values.
    Standard,
    /// Over-long e-mail, URLs, Cyrillic addresses and identifiers.
    #[default]
    Stress,
}

/// The ticket rendered by both adapters.
pub fn build_context() -> TicketContext {
    build_context_with(Fixture::default())
}

pub fn build_context_with(fixture: Fixture) -> TicketContext {
    let values = match fixture {
        Fixture::Standard => FixtureValues {
            email: "ivanov@example.com".to_string(),
            deep_link: "https://client.example.com/api/q/a1b2c3".to_string(),
            departure_address: "Санкт-Петербург, Обводного канала наб., 36".to_string(),
            arrival_address: "Казань, ул. Девятаева, 15".to_string(),
            ticket_number: "MT-000123".to_string(),
            order_number: "ORDER-4567".to_string(),
        },
        Fixture::Stress => {
            let deep_link = format!(
                "https://client.example.com/api/q/{}?{}",
                "opaque-token-with-many-characters-1234567890abcdefghijklmnopqrstuvwxyz",
                "utm_source=pdf&utm_medium=qr&utm_campaign=super-long-campaign-name"
            );
            let address = concat!(
                "Россия, Республика Татарстан, город Казань, улица Санкт-Петербургская, ",
                "дом 123456, корпус 7, подъезд 3, этаж 15, офис 1234567890"
            );
            FixtureValues {
                email: concat!(
                    "verylongemailaddress.with.a.lot.of.parts.and.subdomains.",
                    "evenmorecharactersaddedforstress@example.com"
                )
                .to_string(),
                deep_link,
                departure_address: address.to_string(),
                arrival_address: address.to_string(),
                ticket_number: format!("TICKET-{}", "1234567890".repeat(4)),
                order_number: format!("ORDER-{}", "ABCDEFGHIJKLMNOPQRSTUVWXYZ".repeat(3)),
            }
        }
    };

    let status = TicketStatus::Paid;
    TicketContext {
        i18n: default_labels(),
        route: Route {
            from: "Санкт-Петербург".to_string(),
            to: "Казань".to_string(),
            label: "Санкт-Петербург → Казань · рейс MT-777".to_string(),
            date: "12 ноября 2025".to_string(),
        },
        ticket: TicketNumbers {
            number: values.ticket_number,
            order_number: values.order_number,
            seat: "12A".to_string(),
            baggage: "1×20кг".to_string(),
        },
        passenger: Passenger {
            name: "Иванов Иван Иванович".to_string(),
            phone: "+7 (999) 123-45-67".to_string(),
            email: values.email,
        },
        payment: Payment {
            status: status.label().to_string(),
            method: "Карта Mastercard".to_string(),
            amount: "12 345 ₽".to_string(),
        },
        departure: Stop {
            name: "Автовокзал №1".to_string(),
            datetime: "12.11.2025 08:15".to_string(),
            address: values.departure_address,
            map_url: values.deep_link.clone(),
        },
        arrival: Stop {
            name: "Центральный автовокзал".to_string(),
            datetime: "12.11.2025 21:00".to_string(),
            address: values.arrival_address,
            map_url: values.deep_link.clone(),
        },
        timeline: Timeline {
            duration_text: "12 ч 45 мин".to_string(),
        },
        qr_data_uri: qr_data_uri(),
        deep_link: values.deep_link,
        status_chip: status.status_chip(),
    }
}

struct FixtureValues {
    email: String,
    deep_link: String,
    departure_address: String,
    arrival_address: String,
    ticket_number: String,
    order_number: String,
}

fn default_labels() -> BTreeMap<String, String> {
    [
        ("brand", "Maximov Tours"),
        ("ticket_title", "Электронный билет"),
        ("ticket_number", "Билет №"),
        ("order_number", "Заказ №"),
        ("seat", "Место"),
        ("baggage", "Багаж"),
        ("trip", "Поездка"),
        ("departure", "Отправление"),
        ("arrival", "Прибытие"),
        ("on_the_way", "В пути"),
        ("passenger", "Пассажир"),
        ("payment", "Оплата"),
        ("status", "Статус"),
        ("method", "Метод"),
        ("amount", "Сумма"),
        ("qr_title", "QR + ссылка"),
        ("open_online", "Открыть онлайн"),
        ("hotline", "на линии +7 (800) 555-35-35"),
        ("since", "с 1991 года"),
        ("time_note", "Время может отличаться"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Placeholder QR code: a static vector image, not an encoding of the link.
const QR_PLACEHOLDER_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='120' height='120' viewBox='0 0 120 120'>\
<rect width='120' height='120' fill='#ffffff'/>\
<rect x='8' y='8' width='32' height='32' fill='#111827'/>\
<rect x='80' y='8' width='32' height='32' fill='#111827'/>\
<rect x='8' y='80' width='32' height='32' fill='#111827'/>\
<rect x='52' y='52' width='16' height='16' fill='#111827'/>\
</svg>";

pub fn qr_data_uri() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        BASE64_STD.encode(QR_PLACEHOLDER_SVG.as_bytes())
    )
}
