//! Reference processor pool.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::PaymentMethod;
use crate::processors::{MethodOverride, MockConfig, MockProcessor, OutcomeDistribution};

/// PayFlow: general purpose. 70% approval, 20% soft decline, 10% errors.
pub fn pay_flow() -> MockProcessor {
    MockProcessor::new(MockConfig {
        name: "PayFlow",
        methods: vec![
            PaymentMethod::Card,
            PaymentMethod::Pix,
            PaymentMethod::Oxxo,
            PaymentMethod::Pse,
        ],
        default_outcomes: OutcomeDistribution {
            approval_rate: 0.70,
            soft_decline_rate: 0.20,
            hard_decline_rate: 0.00,
            error_rate: 0.10,
        },
        method_overrides: Vec::new(),
        min_latency: Duration::from_millis(50),
        max_latency: Duration::from_millis(200),
    })
}

/// CardMax: strong on cards. 85% approval, 10% soft decline, 5% hard decline.
pub fn card_max() -> MockProcessor {
    MockProcessor::new(MockConfig {
        name: "CardMax",
        methods: vec![PaymentMethod::Card, PaymentMethod::Oxxo],
        default_outcomes: OutcomeDistribution {
            approval_rate: 0.85,
            soft_decline_rate: 0.10,
            hard_decline_rate: 0.05,
            error_rate: 0.00,
        },
        method_overrides: Vec::new(),
        min_latency: Duration::from_millis(80),
        max_latency: Duration::from_millis(300),
    })
}

/// PixPay: LATAM specialist. 90% approval on pix, 50% on cards.
pub fn pix_pay() -> MockProcessor {
    MockProcessor::new(MockConfig {
        name: "PixPay",
        methods: vec![PaymentMethod::Card, PaymentMethod::Pix],
        default_outcomes: OutcomeDistribution {
            approval_rate: 0.50,
            soft_decline_rate: 0.30,
            hard_decline_rate: 0.10,
            error_rate: 0.10,
        },
        method_overrides: vec![MethodOverride {
            method: PaymentMethod::Pix,
            distribution: OutcomeDistribution {
                approval_rate: 0.90,
                soft_decline_rate: 0.05,
                hard_decline_rate: 0.00,
                error_rate: 0.05,
            },
        }],
        min_latency: Duration::from_millis(30),
        max_latency: Duration::from_millis(150),
    })
}

/// GlobalPay: universal fallback. 75% flat approval.
pub fn global_pay() -> MockProcessor {
    MockProcessor::new(MockConfig {
        name: "GlobalPay",
        methods: vec![
            PaymentMethod::Card,
            PaymentMethod::Pix,
            PaymentMethod::Oxxo,
            PaymentMethod::Pse,
        ],
        default_outcomes: OutcomeDistribution {
            approval_rate: 0.75,
            soft_decline_rate: 0.15,
            hard_decline_rate: 0.05,
            error_rate: 0.05,
        },
        method_overrides: Vec::new(),
        min_latency: Duration::from_millis(60),
        max_latency: Duration::from_millis(250),
    })
}

/// The full reference pool in configuration order.
pub fn reference_pool() -> Vec<Arc<MockProcessor>> {
    vec![
        Arc::new(pay_flow()),
        Arc::new(card_max()),
        Arc::new(pix_pay()),
        Arc::new(global_pay()),
    ]
}
