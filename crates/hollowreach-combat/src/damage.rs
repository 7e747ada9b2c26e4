//! The damage formula.

use hollowreach_types::CombatStats;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// `floor(max(0, attack - defense / 2) * power)`.
///
/// Negative or absurd multipliers clamp to zero damage; results past
/// `u32::MAX` saturate.
pub fn compute_damage(attacker: &CombatStats, defender: &CombatStats, power: Decimal) -> u32 {
    let half_defense = Decimal::from(defender.defense)
        .checked_div(Decimal::TWO)
        .unwrap_or(Decimal::ZERO);
    let Some(base) = Decimal::from(attacker.attack).checked_sub(half_defense) else {
        return 0;
    };
    if base <= Decimal::ZERO || power <= Decimal::ZERO {
        return 0;
    }
    base.checked_mul(power)
        .map_or(u32::MAX, |raw| raw.floor().to_u32().unwrap_or(u32::MAX))
}
