//! # Reverse Mappings (RMAP)
//!
//! Rastreia qual (pid, vpn) é dono de cada página física residente.
//!
//! Além do vetor indexado por ppn, mantém uma lista densa dos ppns
//! residentes para sortear uma vítima em O(1) sem varrer buracos.

use rand::Rng;

use crate::mm::addr::{PageKey, Ppn};
use crate::mm::error::{MmError, MmResult};

/// Marca de "não está na lista densa"
const NOT_RESIDENT: usize = usize::MAX;

pub struct ResidentIndex {
    /// Dono de cada ppn (None = não residente)
    owners: Vec<Option<PageKey>>,
    /// Ppns residentes, sem ordem
    dense: Vec<Ppn>,
    /// Posição de cada ppn em `dense`
    position: Vec<usize>,
}

impl ResidentIndex {
    pub fn new(num_pages: usize) -> Self {
        Self {
            owners: vec![None; num_pages],
            dense: Vec::with_capacity(num_pages),
            position: vec![NOT_RESIDENT; num_pages],
        }
    }

    /// Registra `key` como dono de `ppn`
    pub fn register(&mut self, ppn: Ppn, key: PageKey) -> MmResult<()> {
        let index = ppn as usize;
        match self.owners.get(index) {
            None => return Err(MmError::OutOfBounds),
            Some(Some(owner)) if *owner != key => {
                crate::kerror!("(RMAP) ppn já tem outro dono ppn/pid=", ppn, owner.pid);
                return Err(MmError::AlreadyMapped);
            }
            Some(Some(_)) => return Ok(()),
            Some(None) => {}
        }

        self.owners[index] = Some(key);
        self.position[index] = self.dense.len();
        self.dense.push(ppn);
        Ok(())
    }

    /// Remove o dono de `ppn`, devolvendo quem era
    pub fn unregister(&mut self, ppn: Ppn) -> Option<PageKey> {
        let index = ppn as usize;
        let owner = self.owners.get_mut(index)?.take()?;

        let pos = self.position[index];
        self.dense.swap_remove(pos);
        if let Some(&moved) = self.dense.get(pos) {
            self.position[moved as usize] = pos;
        }
        self.position[index] = NOT_RESIDENT;
        Some(owner)
    }

    #[inline]
    pub fn owner(&self, ppn: Ppn) -> Option<PageKey> {
        self.owners.get(ppn as usize).copied().flatten()
    }

    #[inline]
    pub fn contains(&self, ppn: Ppn) -> bool {
        self.owner(ppn).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Sorteia uniformemente um ppn residente
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Ppn, PageKey)> {
        if self.dense.is_empty() {
            return None;
        }
        let ppn = self.dense[rng.gen_range(0..self.dense.len())];
        self.owner(ppn).map(|key| (ppn, key))
    }

    /// Itera (ppn, dono) dos residentes
    pub fn iter(&self) -> impl Iterator<Item = (Ppn, PageKey)> + '_ {
        self.dense
            .iter()
            .filter_map(move |&ppn| self.owner(ppn).map(|key| (ppn, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn unregister_keeps_dense_list_consistent() {
        let mut rmap = ResidentIndex::new(4);
        for ppn in 0..4 {
            rmap.register(ppn, PageKey::new(1, ppn + 10)).unwrap();
        }
        assert_eq!(rmap.unregister(0), Some(PageKey::new(1, 10)));
        assert_eq!(rmap.unregister(0), None);
        assert_eq!(rmap.len(), 3);

        let mut seen: Vec<Ppn> = rmap.iter().map(|(ppn, _)| ppn).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);

        assert_eq!(rmap.unregister(3), Some(PageKey::new(1, 13)));
        assert_eq!(rmap.owner(1), Some(PageKey::new(1, 11)));
        assert_eq!(rmap.owner(2), Some(PageKey::new(1, 12)));
    }

    #[test]
    fn register_rejects_second_owner() {
        let mut rmap = ResidentIndex::new(2);
        rmap.register(1, PageKey::new(1, 0)).unwrap();
        assert_eq!(
            rmap.register(1, PageKey::new(2, 0)),
            Err(MmError::AlreadyMapped)
        );
        assert_eq!(rmap.register(5, PageKey::new(1, 0)), Err(MmError::OutOfBounds));
    }

    #[test]
    fn pick_only_returns_residents() {
        let mut rmap = ResidentIndex::new(8);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(rmap.pick(&mut rng).is_none());

        rmap.register(5, PageKey::new(3, 1)).unwrap();
        rmap.register(2, PageKey::new(3, 2)).unwrap();
        for _ in 0..32 {
            let (ppn, key) = rmap.pick(&mut rng).unwrap();
            assert!(ppn == 5 || ppn == 2);
            assert_eq!(rmap.owner(ppn), Some(key));
        }
    }
}
