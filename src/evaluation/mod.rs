//! The evaluation pipeline: lifecycle, price resolution, barrier lookback,
//! basket aggregation, and the family payoff calculators

mod basket;
mod engine;
mod lifecycle;
mod lookback;
mod orion;
mod participation;
mod resolver;
mod result;

pub use basket::{aggregate, BasketMode};
pub use engine::EvaluationEngine;
pub use lifecycle::{classify_orion, classify_participation, Lifecycle, LifecycleStatus};
pub use lookback::{BarrierLookbackScanner, BarrierScan, ScanGap};
pub use orion::{evaluate_orion, BarrierHitStatus, OrionEvaluation, OrionUnderlyingOutcome};
pub use participation::{
    evaluate_participation, CallOutcome, ParticipationEvaluation, RedemptionKind,
};
pub use resolver::{PriceQuote, PriceResolver, PriceSource, ResolvedPrices};
pub use result::{EvaluatedUnderlying, EvaluationResult, Payoff};
