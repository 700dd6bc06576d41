//! Safety validator.

use rust_decimal::Decimal;
use thiserror::Error;

use super::{MinimumOrderSizes, ModeRiskLimits};
use crate::domain::order_execution::{BalanceSnapshot, OrderRequest, OrderSide, OrderType};
use crate::domain::trading_mode::TradingMode;

/// A rule an order request broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyViolation {
    /// Malformed request; the caller can fix it.
    #[error("invalid order: {reason}")]
    InvalidOrder {
        /// What is wrong.
        reason: String,
    },

    /// Not enough of the asset the order spends.
    #[error("insufficient {asset} balance: required {required}, available {available}")]
    InsufficientFunds {
        /// Asset that is short.
        asset: String,
        /// Amount the order needs.
        required: Decimal,
        /// Amount available.
        available: Decimal,
    },

    /// A per-mode risk limit would be exceeded.
    #[error("risk limit {limit} exceeded in {mode} mode: {observed} > {maximum}")]
    RiskLimitExceeded {
        /// Which limit.
        limit: &'static str,
        /// Mode whose limits applied.
        mode: TradingMode,
        /// Value the order would produce.
        observed: Decimal,
        /// Configured maximum.
        maximum: Decimal,
    },
}

/// Facts about the executing gateway that balance and risk checks need.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Balances of the gateway that will execute the order.
    pub balance: &'a BalanceSnapshot,
    /// Orders currently open on that gateway.
    pub open_orders: usize,
    /// Current market price, used for market-order notionals.
    pub price_estimate: Decimal,
}

/// Pre-trade validator.
#[derive(Debug, Clone, Default)]
pub struct SafetyValidator {
    minimum_sizes: MinimumOrderSizes,
    limits: ModeRiskLimits,
}

impl SafetyValidator {
    /// Create a validator with the given minimums and limits.
    #[must_use]
    pub const fn new(minimum_sizes: MinimumOrderSizes, limits: ModeRiskLimits) -> Self {
        Self {
            minimum_sizes,
            limits,
        }
    }

    /// Run every check in order: shape, balance, risk.
    pub fn validate(
        &self,
        request: &OrderRequest,
        mode: TradingMode,
        context: &ValidationContext<'_>,
    ) -> Result<(), SafetyViolation> {
        self.validate_shape(request)?;
        self.validate_balance(request, context)?;
        self.validate_risk(request, mode, context)
    }

    /// Checks that need nothing but the request itself.
    pub fn validate_shape(&self, request: &OrderRequest) -> Result<(), SafetyViolation> {
        if request.amount() <= Decimal::ZERO {
            return Err(invalid(format!(
                "amount must be positive, got {}",
                request.amount()
            )));
        }

        match (request.order_type(), request.limit_price()) {
            (OrderType::Limit, None) => return Err(invalid("limit order requires a price")),
            (OrderType::Limit, Some(price)) if price <= Decimal::ZERO => {
                return Err(invalid(format!("limit price must be positive, got {price}")));
            }
            (OrderType::Market, Some(_)) => {
                return Err(invalid("market order must not carry a price"));
            }
            _ => {}
        }

        let minimum = self.minimum_sizes.for_market(request.market());
        if request.amount() < minimum {
            return Err(invalid(format!(
                "order size {} is below minimum {} for {}",
                request.amount(),
                minimum,
                request.market()
            )));
        }

        validate_protective_prices(request)
    }

    /// Whether the gateway holds enough of the asset the order spends.
    pub fn validate_balance(
        &self,
        request: &OrderRequest,
        context: &ValidationContext<'_>,
    ) -> Result<(), SafetyViolation> {
        let (asset, required) = match request.side() {
            OrderSide::Buy => (
                request.market().quote(),
                request.amount() * request.reference_price(context.price_estimate),
            ),
            OrderSide::Sell => (request.market().base(), request.amount()),
        };

        let available = context.balance.available(asset);
        if required > available {
            return Err(SafetyViolation::InsufficientFunds {
                asset: asset.to_string(),
                required,
                available,
            });
        }
        Ok(())
    }

    /// Per-mode notional and open-order limits.
    pub fn validate_risk(
        &self,
        request: &OrderRequest,
        mode: TradingMode,
        context: &ValidationContext<'_>,
    ) -> Result<(), SafetyViolation> {
        let limits = self.limits.for_mode(mode);

        let notional = request.amount() * request.reference_price(context.price_estimate);
        if notional > limits.max_trade_amount {
            return Err(SafetyViolation::RiskLimitExceeded {
                limit: "max_trade_amount",
                mode,
                observed: notional,
                maximum: limits.max_trade_amount,
            });
        }

        let open_after = context.open_orders + 1;
        if open_after > limits.max_open_orders {
            return Err(SafetyViolation::RiskLimitExceeded {
                limit: "max_open_orders",
                mode,
                observed: Decimal::from(open_after),
                maximum: Decimal::from(limits.max_open_orders),
            });
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> SafetyViolation {
    SafetyViolation::InvalidOrder {
        reason: reason.into(),
    }
}

fn validate_protective_prices(request: &OrderRequest) -> Result<(), SafetyViolation> {
    let stop = request.stop_loss_price();
    let target = request.take_profit_price();

    for (name, price) in [("stop-loss", stop), ("take-profit", target)] {
        if let Some(price) = price
            && price <= Decimal::ZERO
        {
            return Err(invalid(format!("{name} price must be positive, got {price}")));
        }
    }

    // Exits sit on the losing and winning side of the entry respectively.
    let below = |low: Option<Decimal>, high: Option<Decimal>| match (low, high) {
        (Some(low), Some(high)) => low < high,
        _ => true,
    };
    let entry = request.limit_price();
    let consistent = match request.side() {
        OrderSide::Buy => below(stop, entry) && below(entry, target) && below(stop, target),
        OrderSide::Sell => below(target, entry) && below(entry, stop) && below(target, stop),
    };

    if !consistent {
        return Err(invalid(format!(
            "stop-loss and take-profit are inconsistent with a {} order",
            request.side()
        )));
    }
    Ok(())
}
