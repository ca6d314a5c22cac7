//! # Tabela de Tradução Global
//!
//! Mapa (pid, vpn) → entrada, compartilhado por todos os processos, mais o
//! reverse map ppn → dono. As duas estruturas só mudam juntas, dentro do
//! lock global do pager.

use std::collections::HashMap;

use rand::Rng;

use super::entry::TranslationEntry;
use crate::mm::addr::{PageKey, Pid, Ppn, Vpn};
use crate::mm::error::{MmError, MmResult};
use crate::mm::pfm::ResidentIndex;

pub struct PageTable {
    entries: HashMap<PageKey, TranslationEntry>,
    resident: ResidentIndex,
}

impl PageTable {
    pub fn new(num_phys_pages: usize) -> Self {
        Self {
            entries: HashMap::new(),
            resident: ResidentIndex::new(num_phys_pages),
        }
    }

    /// Entrada de (pid, vpn), se existir
    #[inline]
    pub fn lookup(&self, pid: Pid, vpn: Vpn) -> Option<TranslationEntry> {
        self.entries.get(&PageKey::new(pid, vpn)).copied()
    }

    /// Insere uma entrada nova. Entradas válidas entram no reverse map.
    pub fn insert(&mut self, pid: Pid, vpn: Vpn, entry: TranslationEntry) -> MmResult<()> {
        let key = PageKey::new(pid, vpn);
        if self.entries.contains_key(&key) {
            crate::kwarn!("(PT) insert duplicado pid/vpn=", pid, vpn);
            return Err(MmError::AlreadyMapped);
        }
        if entry.is_valid() {
            self.resident.register(entry.ppn, key)?;
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Atualiza uma entrada existente com o que veio do TLB.
    ///
    /// USED/DIRTY são somados (OR) aos bits já registrados e o ppn é
    /// sobrescrito. Uma entrada inválida vinda do TLB não muda nada.
    pub fn update(&mut self, pid: Pid, vpn: Vpn, entry: TranslationEntry) -> MmResult<()> {
        let key = PageKey::new(pid, vpn);
        let old = match self.entries.get(&key) {
            Some(old) => *old,
            None => return Err(MmError::NotMapped),
        };
        if !entry.is_valid() {
            return Ok(());
        }

        let mut merged = entry;
        merged.flags |= old.hw_bits();

        if let Some(owner) = self.resident.owner(merged.ppn) {
            if owner != key {
                crate::kerror!("(PT) update para ppn de outro dono pid/vpn/ppn=", pid, vpn, merged.ppn);
                return Err(MmError::AlreadyMapped);
            }
        }
        if old.is_valid() && old.ppn != merged.ppn {
            self.resident.unregister(old.ppn);
        }
        self.resident.register(merged.ppn, key)?;
        self.entries.insert(key, merged);
        Ok(())
    }

    /// Remove a entrada, devolvendo o que havia nela
    pub fn remove(&mut self, pid: Pid, vpn: Vpn) -> MmResult<TranslationEntry> {
        let entry = self
            .entries
            .remove(&PageKey::new(pid, vpn))
            .ok_or(MmError::NotMapped)?;
        if entry.is_valid() {
            self.resident.unregister(entry.ppn);
        }
        Ok(entry)
    }

    /// Sorteia uniformemente uma página residente
    pub fn pick_eviction_victim<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<(PageKey, TranslationEntry)> {
        let (_, key) = self.resident.pick(rng)?;
        self.entries.get(&key).map(|entry| (key, *entry))
    }

    /// Vpns com entrada para o processo
    pub fn vpns_of(&self, pid: Pid) -> Vec<Vpn> {
        let mut vpns: Vec<Vpn> = self
            .entries
            .keys()
            .filter(|key| key.pid == pid)
            .map(|key| key.vpn)
            .collect();
        vpns.sort_unstable();
        vpns
    }

    #[inline]
    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    #[inline]
    pub fn owner_of(&self, ppn: Ppn) -> Option<PageKey> {
        self.resident.owner(ppn)
    }

    /// Ppns residentes
    pub fn resident_pages(&self) -> impl Iterator<Item = (Ppn, PageKey)> + '_ {
        self.resident.iter()
    }

    /// Reverse map e tabela concordam: cada entrada válida é dona do seu
    /// ppn e nenhum ppn tem dono sem entrada.
    pub fn check_consistency(&self) -> MmResult<()> {
        let mut valid = 0usize;
        for (key, entry) in &self.entries {
            if !entry.is_valid() {
                continue;
            }
            valid += 1;
            if self.resident.owner(entry.ppn) != Some(*key) {
                crate::kerror!("(PT) ppn sem dono correto pid/vpn/ppn=", key.pid, key.vpn, entry.ppn);
                return Err(MmError::InvariantViolation);
            }
        }
        if valid != self.resident.len() {
            crate::kerror!("(PT) reverse map diverge valid/resident=", valid, self.resident.len());
            return Err(MmError::InvariantViolation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::vmm::entry::EntryFlags;

    fn valid(vpn: Vpn, ppn: Ppn) -> TranslationEntry {
        TranslationEntry::new(vpn, ppn, EntryFlags::VALID)
    }

    #[test]
    fn insert_twice_fails() {
        let mut table = PageTable::new(4);
        table.insert(1, 0, valid(0, 2)).unwrap();
        assert_eq!(table.insert(1, 0, valid(0, 3)), Err(MmError::AlreadyMapped));
        assert_eq!(table.owner_of(2), Some(PageKey::new(1, 0)));
        assert_eq!(table.owner_of(3), None);
    }

    #[test]
    fn update_merges_bits_and_moves_ppn() {
        let mut table = PageTable::new(4);
        let mut first = valid(5, 1);
        first.set_dirty();
        table.insert(2, 5, first).unwrap();

        let mut from_tlb = valid(5, 3);
        from_tlb.set_used();
        table.update(2, 5, from_tlb).unwrap();

        let entry = table.lookup(2, 5).unwrap();
        assert_eq!(entry.ppn, 3);
        assert!(entry.is_used() && entry.is_dirty());
        assert_eq!(table.owner_of(1), None);
        assert_eq!(table.owner_of(3), Some(PageKey::new(2, 5)));
        table.check_consistency().unwrap();
    }

    #[test]
    fn update_and_remove_missing_fail() {
        let mut table = PageTable::new(2);
        assert_eq!(table.update(1, 1, valid(1, 0)), Err(MmError::NotMapped));
        assert_eq!(table.remove(1, 1), Err(MmError::NotMapped));
    }

    #[test]
    fn invalid_update_is_ignored() {
        let mut table = PageTable::new(2);
        table.insert(1, 1, valid(1, 0)).unwrap();
        table.update(1, 1, TranslationEntry::INVALID).unwrap();
        assert_eq!(table.lookup(1, 1), Some(valid(1, 0)));
    }

    #[test]
    fn remove_unregisters_page() {
        let mut table = PageTable::new(2);
        table.insert(1, 0, valid(0, 1)).unwrap();
        table.insert(1, 1, TranslationEntry::new(1, 0, EntryFlags::empty())).unwrap();
        assert_eq!(table.resident_count(), 1);
        assert_eq!(table.remove(1, 0).unwrap().ppn, 1);
        assert_eq!(table.resident_count(), 0);
        assert_eq!(table.vpns_of(1), vec![1]);
        table.check_consistency().unwrap();
    }
}
