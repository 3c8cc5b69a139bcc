//! Per-side supply, stock, cooldowns and the production queue.
//!
//! Supply is fixed-point so fractional regeneration stays deterministic.
//! Every request is checked in full before anything is deducted: a declined
//! request leaves supply, stock and cooldowns exactly as they were.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::catalog::{AbilityKind, Catalog, UnitArchetype};
use crate::components::Team;
use crate::error::ProductionError;
use crate::math::Fixed;
use crate::world::World;

/// A paid-for unit waiting to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueuedUnit {
    /// Archetype key.
    pub key: String,
    /// Ticks until it deploys.
    pub ready_in: u32,
}

/// An ability bought and awaiting a target point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingDesignation {
    /// Archetype key of the ability.
    pub key: String,
    /// Ability kind.
    pub ability: AbilityKind,
    /// Supply paid, refunded on cancel.
    pub cost: u32,
}

/// Result of an accepted production request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionReceipt {
    /// The unit is queued for deployment.
    Queued {
        /// Archetype key.
        key: String,
    },
    /// The ability is armed and waits for a target point.
    AwaitingTarget {
        /// Archetype key.
        key: String,
        /// Ability kind.
        ability: AbilityKind,
    },
}

/// Economy of one side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SideEconomy {
    supply: Fixed,
    max_supply: u32,
    regen: Fixed,
    stock: BTreeMap<String, u32>,
    cooldowns: BTreeMap<String, u32>,
    queue: VecDeque<QueuedUnit>,
    pending: Option<PendingDesignation>,
    built_unique: BTreeSet<String>,
    supply_spent: u32,
}

impl SideEconomy {
    /// Starting economy from catalog tunables and stock.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let tunables = catalog.tunables();
        let stock = catalog
            .units()
            .filter(|u| u.stock > 0)
            .map(|u| (u.key.clone(), u.stock))
            .collect();
        let max_supply = tunables.max_supply;
        Self {
            supply: Fixed::from_num(tunables.starting_supply.min(max_supply)),
            max_supply,
            regen: tunables.supply_regen,
            stock,
            cooldowns: BTreeMap::new(),
            queue: VecDeque::new(),
            pending: None,
            built_unique: BTreeSet::new(),
            supply_spent: 0,
        }
    }

    /// Current supply.
    #[must_use]
    pub fn supply(&self) -> Fixed {
        self.supply
    }

    /// Current supply rounded down.
    #[must_use]
    pub fn whole_supply(&self) -> u32 {
        self.supply.saturating_to_num::<u32>()
    }

    /// Supply cap.
    #[must_use]
    pub fn max_supply(&self) -> u32 {
        self.max_supply
    }

    /// Total supply spent this match.
    #[must_use]
    pub fn supply_spent(&self) -> u32 {
        self.supply_spent
    }

    /// Overwrite supply, clamped into `[0, max]`.
    pub fn set_supply(&mut self, supply: Fixed) {
        self.supply = supply;
        self.clamp();
    }

    /// Remaining stock of `key`.
    #[must_use]
    pub fn stock(&self, key: &str) -> u32 {
        self.stock.get(key).copied().unwrap_or(0)
    }

    /// Overwrite the stock of `key`.
    pub fn set_stock(&mut self, key: &str, count: u32) {
        self.stock.insert(key.to_string(), count);
    }

    /// Keys with stock remaining, in key order.
    pub fn stocked_keys(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stock
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(k, &n)| (k.as_str(), n))
    }

    /// Production cooldown remaining for `key`.
    #[must_use]
    pub fn cooldown(&self, key: &str) -> u32 {
        self.cooldowns.get(key).copied().unwrap_or(0)
    }

    /// Units waiting to deploy.
    pub fn queue(&self) -> impl Iterator<Item = &QueuedUnit> {
        self.queue.iter()
    }

    /// The ability currently awaiting a target.
    #[must_use]
    pub fn pending_designation(&self) -> Option<&PendingDesignation> {
        self.pending.as_ref()
    }

    /// Whether a unique structure has been started.
    #[must_use]
    pub fn unique_built(&self, key: &str) -> bool {
        self.built_unique.contains(key)
    }

    /// Pull supply back into `[0, max]`.
    pub fn clamp(&mut self) {
        let cap = Fixed::from_num(self.max_supply);
        if self.supply > cap {
            self.supply = cap;
        }
        if self.supply < Fixed::ZERO {
            self.supply = Fixed::ZERO;
        }
    }

    /// Regenerate one tick of supply, up to the cap.
    pub fn regenerate(&mut self) {
        self.supply = self.supply.saturating_add(self.regen);
        self.clamp();
    }

    /// Raise the supply cap.
    pub fn raise_cap(&mut self, bonus: u32) {
        self.max_supply = self.max_supply.saturating_add(bonus);
    }

    /// Count production cooldowns down, dropping expired entries.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
    }

    fn check_supply(&self, cost: u32) -> Result<(), ProductionError> {
        if self.supply < Fixed::from_num(cost) {
            return Err(ProductionError::InsufficientSupply {
                required: cost,
                available: self.whole_supply(),
            });
        }
        Ok(())
    }

    fn deduct(&mut self, cost: u32) {
        self.supply -= Fixed::from_num(cost);
        self.supply_spent = self.supply_spent.saturating_add(cost);
        self.clamp();
    }

    /// Pay `cost` from supply.
    pub fn spend(&mut self, cost: u32) -> Result<(), ProductionError> {
        self.check_supply(cost)?;
        self.deduct(cost);
        Ok(())
    }

    /// Return `amount` supply, up to the cap.
    pub fn refund(&mut self, amount: u32) {
        self.supply = self.supply.saturating_add(Fixed::from_num(amount));
        self.supply_spent = self.supply_spent.saturating_sub(amount);
        self.clamp();
    }

    /// Put one unit of `key` back into stock.
    pub fn return_stock(&mut self, key: &str) {
        *self.stock.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Order one unit or ability.
    ///
    /// Checks stock, cooldown and supply together; on success deducts supply,
    /// decrements stock by exactly one and starts the cooldown.
    pub fn request_production(
        &mut self,
        archetype: &UnitArchetype,
    ) -> Result<ProductionReceipt, ProductionError> {
        let key = archetype.key.as_str();

        if archetype.is_ability() {
            if let Some(pending) = &self.pending {
                return Err(ProductionError::DesignationPending {
                    key: pending.key.clone(),
                });
            }
        }

        let stock = self.stock(key);
        if stock == 0 {
            return Err(ProductionError::OutOfStock {
                key: key.to_string(),
            });
        }

        let remaining = self.cooldown(key);
        if remaining > 0 {
            return Err(ProductionError::OnCooldown {
                key: key.to_string(),
                remaining,
            });
        }

        self.check_supply(archetype.cost)?;

        self.deduct(archetype.cost);
        self.stock.insert(key.to_string(), stock - 1);
        if archetype.production_cooldown > 0 {
            self.cooldowns
                .insert(key.to_string(), archetype.production_cooldown);
        }

        if let Some(ability) = archetype.ability {
            self.pending = Some(PendingDesignation {
                key: key.to_string(),
                ability,
                cost: archetype.cost,
            });
            return Ok(ProductionReceipt::AwaitingTarget {
                key: key.to_string(),
                ability,
            });
        }

        self.queue.push_back(QueuedUnit {
            key: key.to_string(),
            ready_in: archetype.deploy_delay,
        });
        Ok(ProductionReceipt::Queued {
            key: key.to_string(),
        })
    }

    /// Advance the queue by a tick and return the keys ready to deploy.
    pub fn take_ready(&mut self) -> Vec<String> {
        let mut ready = Vec::new();
        let mut waiting = VecDeque::with_capacity(self.queue.len());
        for mut entry in self.queue.drain(..) {
            if entry.ready_in == 0 {
                ready.push(entry.key);
            } else {
                entry.ready_in -= 1;
                waiting.push_back(entry);
            }
        }
        self.queue = waiting;
        ready
    }

    /// Consume the armed ability for a designation.
    pub fn take_designation(&mut self) -> Result<PendingDesignation, ProductionError> {
        self.pending.take().ok_or(ProductionError::NoPendingDesignation)
    }

    /// Disarm the pending ability, refunding its supply and stock.
    pub fn cancel_designation(&mut self) -> Result<PendingDesignation, ProductionError> {
        let pending = self.take_designation()?;
        self.refund(pending.cost);
        self.return_stock(&pending.key);
        self.cooldowns.remove(&pending.key);
        Ok(pending)
    }

    /// Reserve a one-per-match structure.
    pub fn reserve_unique(&mut self, key: &str) -> Result<(), ProductionError> {
        if !self.built_unique.insert(key.to_string()) {
            return Err(ProductionError::UniqueAlreadyBuilt {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Empty every stock entry, returning what was held.
    pub fn commit_reserve(&mut self) -> Vec<(String, u32)> {
        let reserve: Vec<(String, u32)> = self
            .stock
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(k, &n)| (k.clone(), n))
            .collect();
        for (key, _) in &reserve {
            self.stock.insert(key.clone(), 0);
        }
        reserve
    }
}

/// Deploy every queued unit whose delay has elapsed, for both sides.
///
/// Units appear at the first completed building producing their category,
/// falling back to the headquarters.
pub fn drain_production_queues(world: &mut World) {
    for team in [Team::Player, Team::Enemy] {
        let ready = world.economy_mut(team).take_ready();
        for key in ready {
            let archetype = world.catalog().resolve_unit(&key);
            let position = world.production_site(team, archetype.category);
            let id = world.spawn_unit(team, &key, position);
            tracing::debug!(tick = world.tick, unit = %key, id, ?team, "Unit deployed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> (Catalog, SideEconomy) {
        let catalog = Catalog::standard();
        let economy = SideEconomy::new(&catalog);
        (catalog, economy)
    }

    #[test]
    fn test_successful_request_deducts_everything_once() {
        let (catalog, mut economy) = economy();
        let infantry = catalog.unit("infantry").expect("infantry");
        economy.set_stock("infantry", 5);

        let receipt = economy.request_production(&infantry).expect("accepted");
        assert_eq!(
            receipt,
            ProductionReceipt::Queued {
                key: "infantry".to_string()
            }
        );
        assert_eq!(economy.supply(), Fixed::from_num(80));
        assert_eq!(economy.stock("infantry"), 4);
        assert_eq!(economy.cooldown("infantry"), infantry.production_cooldown);
        assert_eq!(economy.queue().count(), 1);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let (catalog, mut economy) = economy();
        let tank = catalog.unit("tank").expect("tank");

        economy.set_supply(Fixed::from_num(10));
        let before = economy.clone();
        let err = economy.request_production(&tank).expect_err("too expensive");
        assert_eq!(
            err,
            ProductionError::InsufficientSupply {
                required: 60,
                available: 10
            }
        );
        assert_eq!(economy, before);

        economy.set_supply(Fixed::from_num(200));
        economy.set_stock("tank", 0);
        let before = economy.clone();
        assert!(matches!(
            economy.request_production(&tank),
            Err(ProductionError::OutOfStock { .. })
        ));
        assert_eq!(economy, before);
    }

    #[test]
    fn test_cooldown_blocks_repeat_orders() {
        let (catalog, mut economy) = economy();
        let infantry = catalog.unit("infantry").expect("infantry");
        economy.request_production(&infantry).expect("first order");

        let before = economy.clone();
        assert!(matches!(
            economy.request_production(&infantry),
            Err(ProductionError::OnCooldown { .. })
        ));
        assert_eq!(economy, before);

        for _ in 0..infantry.production_cooldown {
            economy.tick_cooldowns();
        }
        assert!(economy.request_production(&infantry).is_ok());
    }

    #[test]
    fn test_regeneration_is_capped() {
        let (_, mut economy) = economy();
        economy.set_supply(Fixed::from_num(399.9));
        economy.regenerate();
        assert_eq!(economy.supply(), Fixed::from_num(400));
        economy.regenerate();
        assert_eq!(economy.supply(), Fixed::from_num(400));
    }

    #[test]
    fn test_ability_arms_designation_instead_of_queueing() {
        let (catalog, mut economy) = economy();
        let strike = catalog.unit("airstrike").expect("airstrike");

        let receipt = economy.request_production(&strike).expect("accepted");
        assert!(matches!(receipt, ProductionReceipt::AwaitingTarget { .. }));
        assert_eq!(economy.queue().count(), 0);

        let missile = catalog.unit("guided_missile").expect("missile");
        assert!(matches!(
            economy.request_production(&missile),
            Err(ProductionError::DesignationPending { .. })
        ));
    }

    #[test]
    fn test_cancel_designation_refunds() {
        let (catalog, mut economy) = economy();
        let strike = catalog.unit("airstrike").expect("airstrike");
        let stock = economy.stock("airstrike");
        economy.request_production(&strike).expect("accepted");

        economy.cancel_designation().expect("armed");
        assert_eq!(economy.supply(), Fixed::from_num(100));
        assert_eq!(economy.stock("airstrike"), stock);
        assert_eq!(economy.cooldown("airstrike"), 0);
        assert_eq!(
            economy.cancel_designation(),
            Err(ProductionError::NoPendingDesignation)
        );
    }

    #[test]
    fn test_queue_respects_deploy_delay() {
        let (catalog, mut economy) = economy();
        let jeep = catalog.unit("aa_jeep").expect("aa_jeep");
        economy.request_production(&jeep).expect("accepted");

        for _ in 0..jeep.deploy_delay {
            assert!(economy.take_ready().is_empty());
        }
        assert_eq!(economy.take_ready(), vec!["aa_jeep".to_string()]);
    }

    #[test]
    fn test_unique_reservation_is_one_shot() {
        let (_, mut economy) = economy();
        assert!(economy.reserve_unique("logistics_center").is_ok());
        assert!(economy.unique_built("logistics_center"));
        assert!(economy.reserve_unique("logistics_center").is_err());
    }

    #[test]
    fn test_commit_reserve_empties_stock() {
        let (_, mut economy) = economy();
        let reserve = economy.commit_reserve();
        assert!(!reserve.is_empty());
        assert_eq!(economy.stocked_keys().count(), 0);
    }
}
