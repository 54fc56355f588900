//! Canonical structure-parameter extraction
//!
//! Product documents carry their economic terms in up to three differently
//! spelled parameter bags. Rather than repeating fallback chains through the
//! calculators, each family gets one typed parameter struct built here, with
//! every field resolved independently across the bags and defaulted when
//! absent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::evaluation::BasketMode;
use super::data::{parse_flexible_date, Product};

/// Ordered view over a product's parameter bags. Lookups walk
/// `structureParams`, then `structure`, then `structureParameters` and return
/// the first bag that has the key.
pub struct ParamBag<'a> {
    bags: Vec<&'a Map<String, Value>>,
}

impl<'a> ParamBag<'a> {
    pub fn from_product(product: &'a Product) -> Self {
        let bags = [
            product.structure_params.as_ref(),
            product.structure.as_ref(),
            product.structure_parameters.as_ref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self { bags }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.bags.iter().find_map(|bag| bag.get(key))
    }

    /// Numeric field, tolerating numbers stored as strings
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.raw(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.raw(key)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.raw(key)? {
            Value::String(s) => parse_flexible_date(s),
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
        match self.raw(key)? {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// First present value among several synonymous numeric keys
    pub fn number_any(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| self.number(key))
    }
}

/// Terms of an Orion memory-rebate barrier note, percent-of-initial units
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrionParams {
    pub upper_barrier: f64,
    pub lower_barrier: f64,
    pub rebate: f64,
    pub capital_guaranteed: f64,
    pub coupon_rate: f64,
    pub observation_frequency: String,
    pub memory_coupon: bool,
    pub memory_type: String,
}

impl Default for OrionParams {
    fn default() -> Self {
        Self {
            upper_barrier: 100.0,
            lower_barrier: 70.0,
            rebate: 8.0,
            capital_guaranteed: 100.0,
            coupon_rate: 0.0,
            observation_frequency: "quarterly".to_string(),
            memory_coupon: true,
            memory_type: "full".to_string(),
        }
    }
}

impl OrionParams {
    /// Extract Orion terms from a product document. Each field has its own
    /// fallback chain; rebate and coupon rate may borrow from each other.
    pub fn from_product(product: &Product) -> Self {
        let bag = ParamBag::from_product(product);
        Self {
            upper_barrier: bag.number("upperBarrier").unwrap_or(100.0),
            lower_barrier: bag.number("lowerBarrier").unwrap_or(70.0),
            rebate: bag
                .number("rebate")
                .or_else(|| bag.number("couponRate"))
                .unwrap_or(8.0),
            capital_guaranteed: bag.number("capitalGuaranteed").unwrap_or(100.0),
            coupon_rate: bag
                .number("couponRate")
                .or_else(|| bag.number("rebate"))
                .unwrap_or(0.0),
            observation_frequency: bag
                .string("observationFrequency")
                .unwrap_or_else(|| "quarterly".to_string()),
            memory_coupon: bag.boolean("memoryCoupon").unwrap_or(true),
            memory_type: bag.string("memoryType").unwrap_or_else(|| "full".to_string()),
        }
    }

    /// Performance threshold below which the lower barrier is breached
    pub fn lower_threshold(&self) -> f64 {
        self.lower_barrier - 100.0
    }
}

/// How an issuer-call rebate is quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebateType {
    /// Flat percentage regardless of holding period
    Fixed,
    /// Annual rate prorated over days held
    PerAnnum,
}

impl RebateType {
    fn parse(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("per_annum") | Some("perAnnum") | Some("per-annum") => RebateType::PerAnnum,
            _ => RebateType::Fixed,
        }
    }
}

/// Terms of a participation note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationParams {
    pub participation_rate: f64,
    pub basket_mode: BasketMode,
    pub issuer_call_date: Option<DateTime<Utc>>,
    pub issuer_call_price: Option<f64>,
    pub issuer_call_rebate: f64,
    pub issuer_call_rebate_type: RebateType,
    /// Capital protection floor, applicable only when called
    pub protection_level: Option<f64>,
}

impl ParticipationParams {
    pub fn from_product(product: &Product) -> Self {
        let bag = ParamBag::from_product(product);
        Self {
            participation_rate: bag.number("participationRate").unwrap_or(100.0),
            basket_mode: bag
                .string("basketType")
                .or_else(|| bag.string("basketMode"))
                .map(|s| BasketMode::parse(&s))
                .unwrap_or_default(),
            issuer_call_date: bag.date("issuerCallDate"),
            issuer_call_price: bag.number("issuerCallPrice"),
            issuer_call_rebate: bag.number("issuerCallRebate").unwrap_or(0.0),
            issuer_call_rebate_type: RebateType::parse(bag.string("issuerCallRebateType")),
            protection_level: extract_protection_level(&bag),
        }
    }
}

/// Protection level lives under several names; a `components` array entry of
/// type BARRIER with a protection barrier type is the last resort.
fn extract_protection_level(bag: &ParamBag) -> Option<f64> {
    bag.number_any(&[
        "capitalGuarantee",
        "protectionBarrier",
        "capitalProtection",
        "protectionLevel",
    ])
    .or_else(|| protection_from_components(bag))
}

fn protection_from_components(bag: &ParamBag) -> Option<f64> {
    let components = bag.array("components")?;
    components.iter().find_map(|component| {
        let obj = component.as_object()?;
        let kind = obj.get("type")?.as_str()?;
        if !kind.eq_ignore_ascii_case("BARRIER") {
            return None;
        }
        let barrier_type = obj.get("barrier_type").and_then(Value::as_str)?;
        if !matches!(barrier_type, "protection" | "capital_protection") {
            return None;
        }
        match obj.get("level").or_else(|| obj.get("value"))? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    })
}
