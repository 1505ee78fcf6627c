//! The entity pool.
//!
//! Entities live in one `Vec<Component>` that only grows. A dead slot is
//! reused in place by [`EntityPool::recycle`], lowest index first, so pool
//! indices are stable handles for as long as the entity lives. Iteration
//! order is index order; the per-entity pool scan walks it in reverse,
//! which decides follow tie-breaks.

use crate::component::{Component, SheetId, Template};
use crate::key::CellKey;

#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    slots: Vec<Component>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total slots, live and dead.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|c| !c.dead).count()
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Component> {
        self.slots.get_mut(index)
    }

    /// Every slot, including dead ones.
    pub fn slots(&self) -> &[Component] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Component] {
        &mut self.slots
    }

    /// Spawn an entity, reusing the lowest-index dead slot before growing.
    /// Returns the slot index.
    pub fn recycle(&mut self, key: CellKey, sheet: SheetId, x: f64, y: f64, template: &Template) -> usize {
        match self.slots.iter().position(|c| c.dead) {
            Some(index) => {
                self.slots[index].reinit(key, sheet, x, y, template);
                index
            }
            None => {
                self.slots.push(Component::spawn(key, sheet, x, y, template));
                self.slots.len() - 1
            }
        }
    }

    /// [`recycle`](Self::recycle), marking the entity as level-spawned so a
    /// level reset restores it instead of killing it.
    pub fn recycle_from_level(
        &mut self,
        key: CellKey,
        sheet: SheetId,
        x: f64,
        y: f64,
        template: &Template,
    ) -> usize {
        let index = self.recycle(key, sheet, x, y, template);
        self.slots[index].from_level = true;
        index
    }

    /// Live entities with their indices, in index order.
    pub fn live(&self) -> impl Iterator<Item = (usize, &Component)> + '_ {
        self.slots.iter().enumerate().filter(|(_, c)| !c.dead)
    }

    /// Run `f` on every live entity, in index order.
    pub fn for_each_live(&mut self, mut f: impl FnMut(usize, &mut Component)) {
        for (index, c) in self.slots.iter_mut().enumerate() {
            if !c.dead {
                f(index, c);
            }
        }
    }

    /// Mark every entity dead. Slots are kept for reuse.
    pub fn destroy_all(&mut self) {
        for c in &mut self.slots {
            c.dead = true;
        }
    }

    /// Level-spawned entities go back to their origin with fresh template
    /// values (dead ones are revived); everything else is killed.
    pub fn reset_all_or_kill<'t>(&mut self, template_of: impl Fn(SheetId) -> &'t Template) {
        for c in &mut self.slots {
            if c.from_level {
                c.reset(template_of(c.sheet));
            } else {
                c.dead = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(pool: &mut EntityPool, x: f64) -> usize {
        pool.recycle(CellKey::from('e'), SheetId(0), x, 0.0, &Template::default())
    }

    #[test]
    fn recycle_grows_then_reuses_lowest_dead_slot() {
        let mut pool = EntityPool::new();
        for n in 0..4 {
            assert_eq!(spawn(&mut pool, n as f64), n);
        }
        pool.get_mut(2).unwrap().dead = true;
        pool.get_mut(1).unwrap().dead = true;
        assert_eq!(spawn(&mut pool, 9.0), 1);
        assert_eq!(pool.get(1).unwrap().x, 9.0);
        assert!(!pool.get(1).unwrap().dead);
        assert_eq!(spawn(&mut pool, 9.0), 2);
        assert_eq!(spawn(&mut pool, 9.0), 4);
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn destroy_all_keeps_slots() {
        let mut pool = EntityPool::new();
        spawn(&mut pool, 0.0);
        spawn(&mut pool, 1.0);
        pool.destroy_all();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.live().count(), 0);
    }

    #[test]
    fn reset_restores_level_entities_and_kills_others() {
        let template = Template::default();
        let mut pool = EntityPool::new();
        let a = pool.recycle_from_level(CellKey::from('a'), SheetId(0), 1.0, 2.0, &template);
        let b = spawn(&mut pool, 5.0);
        {
            let e = pool.get_mut(a).unwrap();
            e.x = 40.0;
            e.dead = true;
        }
        pool.reset_all_or_kill(|_| &template);
        let e = pool.get(a).unwrap();
        assert!(!e.dead);
        assert_eq!((e.x, e.y), (1.0, 2.0));
        assert!(pool.get(b).unwrap().dead);
    }

    #[test]
    fn for_each_live_skips_dead() {
        let mut pool = EntityPool::new();
        spawn(&mut pool, 0.0);
        spawn(&mut pool, 1.0);
        pool.get_mut(0).unwrap().dead = true;
        let mut seen = Vec::new();
        pool.for_each_live(|i, c| {
            c.vx = 1.0;
            seen.push(i);
        });
        assert_eq!(seen, vec![1]);
        assert_eq!(pool.get(0).unwrap().vx, 0.0);
    }
}
