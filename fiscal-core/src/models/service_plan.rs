use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monthly accounting plans offered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServicePlan {
    /// Individual micro-entrepreneurs (MEI).
    Starter,
    /// Simples Nacional companies serving the domestic market, up to 15k/month.
    Professional,
    /// Companies outside Simples, exporting services, or above 15k/month.
    Specialist,
}

impl ServicePlan {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Starter => "Iniciante",
            Self::Professional => "Profissional",
            Self::Specialist => "Especialista",
        }
    }

    pub fn monthly_fee(&self) -> Decimal {
        match self {
            Self::Starter => Decimal::new(9900, 2),
            Self::Professional => Decimal::new(24900, 2),
            Self::Specialist => Decimal::new(35900, 2),
        }
    }

    /// Plan for a client receiving foreign income.
    ///
    /// Specialist when the amount received exceeds 15k/month or when no
    /// professional draw is taken; Professional otherwise.
    pub fn recommend_for_foreign_income(
        net_received: Decimal,
        professional_draw: Decimal,
    ) -> Self {
        let revenue_threshold = Decimal::from(15000);
        if net_received > revenue_threshold || professional_draw.is_zero() {
            Self::Specialist
        } else {
            Self::Professional
        }
    }
}
