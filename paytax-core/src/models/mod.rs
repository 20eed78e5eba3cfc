mod bracket;
mod contribution;
mod jurisdiction;

pub use bracket::{Bracket, BracketSchedule};
pub use contribution::{
    ContributionKind, ContributionRate, CpfRate, InsuranceSide, SocialInsuranceRates,
};
pub use jurisdiction::Jurisdiction;
