//! # Testes do Subsistema de Memória
//!
//! Organização modular dos testes:
//! - `table_test.rs` - Tabela de tradução e reverse map
//! - `pmm_test.rs` - Alocador de páginas físicas
//! - `swap_test.rs` - Swapper (slots, pending, arquivo)
//! - `fault_test.rs` - Miss de TLB, page fault, eviction
//! - `context_test.rs` - Save/restore de contexto
//! - `process_test.rs` - Carregador, cópia virtual, kernel
//! - `concurrency_test.rs` - Vários processos faultando em paralelo
//!
//! As suites rodam no binário com a feature `self_test` e no `cargo test`
//! pelos wrappers do fim deste arquivo.

pub mod process_test;

use std::sync::Arc;

use crate::arch::{Exception, Processor};
use crate::core::image::{MemoryImage, ProgramImage};
use crate::klib::test_framework::{run_test_suite, TestCase};
use crate::mm::addr::{Pid, VirtAddr};
use crate::mm::aspace::Transfer;
use crate::mm::config::{MmConfig, SwapBacking};
use crate::mm::error::MmResult;
use crate::mm::fault::FaultResult;
use crate::mm::pmm::PhysicalMemory;
use crate::mm::vmm::Pager;

/// Página pequena para os testes caberem em poucos bytes
pub const TEST_PAGE_SIZE: usize = 64;

/// Semente fixa: política de substituição reproduzível
pub const TEST_SEED: u64 = 0x5eed_f00d;

/// Configuração sob demanda com swap em memória
pub fn demand_config(phys_pages: usize, tlb_size: usize) -> MmConfig {
    MmConfig::default()
        .with_page_size(TEST_PAGE_SIZE)
        .with_phys_pages(phys_pages)
        .with_tlb_size(tlb_size)
        .with_stack_pages(2)
        .with_swap(SwapBacking::Memory)
        .with_seed(TEST_SEED)
}

/// Pager isolado (sem kernel)
pub fn new_pager(phys_pages: usize, tlb_size: usize) -> MmResult<Arc<Pager>> {
    let config = demand_config(phys_pages, tlb_size);
    let processor = Arc::new(Processor::new(config.tlb_size, config.page_size));
    let memory = Arc::new(PhysicalMemory::new(config.num_phys_pages, config.page_size));
    Ok(Arc::new(Pager::new(&config, processor, memory)?))
}

/// Imagem com `text_pages` páginas read-only (byte 0x10 + página) e
/// `data_pages` páginas graváveis (byte 0x80 + página)
pub fn sample_image(text_pages: usize, data_pages: usize) -> Arc<dyn ProgramImage> {
    let mut text = Vec::with_capacity(text_pages * TEST_PAGE_SIZE);
    for page in 0..text_pages {
        text.extend(std::iter::repeat(0x10 + page as u8).take(TEST_PAGE_SIZE));
    }
    let mut data = Vec::with_capacity(data_pages * TEST_PAGE_SIZE);
    for page in 0..data_pages {
        data.extend(std::iter::repeat(0x80 + page as u8).take(TEST_PAGE_SIZE));
    }
    Arc::new(
        MemoryImage::builder(TEST_PAGE_SIZE)
            .section(".text", true, &text)
            .section(".data", false, &data)
            .entry(VirtAddr::new(0))
            .build(),
    )
}

/// Endereço `offset` dentro da página `vpn`
pub fn vaddr(vpn: u32, offset: usize) -> VirtAddr {
    VirtAddr::new(vpn * TEST_PAGE_SIZE as u32 + offset as u32)
}

/// Acesso direto ao pager com o laço translate → fault → retranslate
pub fn access(
    pager: &Pager,
    pid: Pid,
    vaddr: VirtAddr,
    data: &mut [u8],
    write: bool,
) -> Result<usize, FaultResult> {
    for _ in 0..4 {
        let transfer = if write {
            Transfer::Write(&data[..])
        } else {
            Transfer::Read(&mut data[..])
        };
        match pager.transfer(pid, vaddr, transfer) {
            Ok(n) => return Ok(n),
            Err(Exception::TlbMiss) => {
                let result = FaultResult::from_miss(pager.handle_miss(pid, vaddr));
                if result != FaultResult::Success {
                    return Err(result);
                }
            }
            Err(other) => return Err(FaultResult::from_exception(other)),
        }
    }
    Err(FaultResult::FatalError)
}

/// Executa todas as suites. Devolve `true` se nenhuma falhou.
pub fn run_paging_tests() -> bool {
    let suites: [(&str, &[TestCase]); 7] = [
        ("table", table_test::TABLE_TESTS),
        ("pmm", pmm_test::PMM_TESTS),
        ("swap", swap_test::SWAP_TESTS),
        ("fault", fault_test::FAULT_TESTS),
        ("context", context_test::CONTEXT_TESTS),
        ("process", process_test::PROCESS_TESTS),
        ("concurrency", concurrency_test::CONCURRENCY_TESTS),
    ];

    let mut ok = true;
    for (name, tests) in suites {
        ok &= run_test_suite(name, tests).ok();
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::klib::test_framework::TestResult;

    fn assert_suite(tests: &[TestCase]) {
        for test in tests {
            assert_eq!((test.func)(), TestResult::Passed, "{}", test.name);
        }
    }

    #[test]
    fn table_suite() {
        assert_suite(table_test::TABLE_TESTS);
    }

    #[test]
    fn pmm_suite() {
        assert_suite(pmm_test::PMM_TESTS);
    }

    #[test]
    fn swap_suite() {
        assert_suite(swap_test::SWAP_TESTS);
    }

    #[test]
    fn fault_suite() {
        assert_suite(fault_test::FAULT_TESTS);
    }

    #[test]
    fn context_suite() {
        assert_suite(context_test::CONTEXT_TESTS);
    }

    #[test]
    fn process_suite() {
        assert_suite(process_test::PROCESS_TESTS);
    }

    #[test]
    fn concurrency_suite() {
        assert_suite(concurrency_test::CONCURRENCY_TESTS);
    }

    mod random_workload {
        use std::collections::HashMap;

        use proptest::prelude::*;

        use super::super::{access, new_pager, vaddr};
        use crate::mm::addr::Pid;

        #[derive(Debug, Clone)]
        enum Op {
            Write { pid: Pid, vpn: u32, value: u8 },
            Read { pid: Pid, vpn: u32 },
            Evict,
            Switch { pid: Pid },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (1u32..=3, 0u32..6, any::<u8>())
                    .prop_map(|(pid, vpn, value)| Op::Write { pid, vpn, value }),
                4 => (1u32..=3, 0u32..6).prop_map(|(pid, vpn)| Op::Read { pid, vpn }),
                1 => Just(Op::Evict),
                1 => (1u32..=3).prop_map(|pid| Op::Switch { pid }),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            #[test]
            fn invariants_hold_under_random_faults(ops in proptest::collection::vec(op(), 1..80)) {
                let pager = new_pager(4, 2).unwrap();
                for pid in 1..=3 {
                    pager.register_space(pid, 6, None).unwrap();
                }

                let mut model: HashMap<(Pid, u32), u8> = HashMap::new();
                let mut running: Pid = 1;

                for op in ops {
                    match op {
                        Op::Write { pid, vpn, value } => {
                            let mut byte = [value];
                            prop_assert_eq!(access(&pager, pid, vaddr(vpn, 3), &mut byte, true), Ok(1));
                            model.insert((pid, vpn), value);
                        }
                        Op::Read { pid, vpn } => {
                            let mut byte = [0xffu8];
                            prop_assert_eq!(access(&pager, pid, vaddr(vpn, 3), &mut byte, false), Ok(1));
                            let expected = model.get(&(pid, vpn)).copied().unwrap_or(0);
                            prop_assert_eq!(byte[0], expected);
                        }
                        Op::Evict => {
                            let mut state = pager.lock();
                            if state.table.resident_count() > 0 {
                                prop_assert!(pager.evict_one(&mut state).is_ok());
                            }
                        }
                        Op::Switch { pid } => {
                            pager.save_context(running);
                            pager.restore_context(pid);
                            running = pid;
                        }
                    }
                    prop_assert!(pager.check_invariants().is_ok());
                }
            }
        }
    }
}
