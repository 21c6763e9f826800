use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::models::{CardVendor, ParsedSms, ServiceError, ServiceResult};

// Card-authorization SMS formats. Timestamps carry no year, the current
// year is assumed. Amounts use thousands separators.
static KB_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[KB국민카드\]\s*(\d{2}/\d{2})\s*(\d{2}:\d{2})\s*승인\s*([\d,]+)원\s*[가-힣A-Za-z]*\s*(.+)",
    )
    .unwrap()
});

static SHINHAN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"신한카드.*?승인.*?([\d,]+)원(?:\([^)]*\))?\s*(\d{2}/\d{2})\s*(\d{2}:\d{2})\s+(.+?)(?:\s+(?:누적|잔여|잔액).*)?$",
    )
    .unwrap()
});

static NH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"NH(?:농협)?카드.*?승인.*?([\d,]+)원.*?(\d{2}/\d{2})\s*(\d{2}:\d{2})\s+(.+?)(?:\s+(?:총누적|누적|잔여).*)?$",
    )
    .unwrap()
});

/// Fallback parser for messages the vendor patterns do not recognize,
/// typically backed by an external chat-model service.
#[async_trait]
pub trait SmsParsingClient: Send + Sync {
    async fn parse(&self, message: &str) -> ServiceResult<ParsedSms>;
}

/// Default fallback that recognizes nothing.
pub struct DisabledSmsParsingClient;

#[async_trait]
impl SmsParsingClient for DisabledSmsParsingClient {
    async fn parse(&self, _message: &str) -> ServiceResult<ParsedSms> {
        Err(ServiceError::SmsParsingFailed)
    }
}

/// Try each vendor pattern in order; None when no pattern matches.
#[instrument(skip(message))]
pub fn parse_card_sms(message: &str) -> Option<ParsedSms> {
    let message = message.trim();

    if let Some(caps) = KB_PATTERN.captures(message) {
        debug!("Matched KB card SMS pattern");
        return build_parsed(
            CardVendor::Kb,
            caps.get(1)?.as_str(),
            caps.get(2)?.as_str(),
            caps.get(3)?.as_str(),
            caps.get(4)?.as_str(),
        );
    }

    if let Some(caps) = SHINHAN_PATTERN.captures(message) {
        debug!("Matched Shinhan card SMS pattern");
        return build_parsed(
            CardVendor::Shinhan,
            caps.get(2)?.as_str(),
            caps.get(3)?.as_str(),
            caps.get(1)?.as_str(),
            caps.get(4)?.as_str(),
        );
    }

    if let Some(caps) = NH_PATTERN.captures(message) {
        debug!("Matched NH card SMS pattern");
        return build_parsed(
            CardVendor::Nh,
            caps.get(2)?.as_str(),
            caps.get(3)?.as_str(),
            caps.get(1)?.as_str(),
            caps.get(4)?.as_str(),
        );
    }

    warn!("No card SMS pattern matched");
    None
}

fn build_parsed(
    vendor: CardVendor,
    date: &str,
    time: &str,
    amount: &str,
    store_name: &str,
) -> Option<ParsedSms> {
    let (month, day) = date.split_once('/')?;
    let (hour, minute) = time.split_once(':')?;

    let amount: i64 = amount.replace(',', "").parse().ok()?;

    let spent_at = Utc
        .with_ymd_and_hms(
            Utc::now().year(),
            month.parse().ok()?,
            day.parse().ok()?,
            hour.parse().ok()?,
            minute.parse().ok()?,
            0,
        )
        .single()?;

    let store_name = store_name.trim();
    if store_name.is_empty() {
        return None;
    }

    Some(ParsedSms {
        vendor,
        spent_at,
        amount,
        store_name: store_name.to_string(),
    })
}
