//! Testes do carregador, da cópia virtual e do kernel

use std::sync::Arc;

use crate::arch::Exception;
use crate::core::image::MemoryImage;
use crate::core::kernel::Kernel;
use crate::core::process::ProcessState;
use crate::klib::test_framework::{TestCase, TestResult};
use crate::mm::addr::VirtAddr;
use crate::mm::config::{SwapBacking, TranslationMode};
use crate::mm::error::MmError;
use crate::{ktest_assert, ktest_try};

use super::{demand_config, sample_image, vaddr, TEST_PAGE_SIZE};

/// Testes de processo
pub const PROCESS_TESTS: &[TestCase] = &[
    TestCase::new("process_layout_and_argv", test_layout_and_argv),
    TestCase::new("process_fragmented_image_rejected", test_fragmented_image_rejected),
    TestCase::new("process_oversized_argv_rejected", test_oversized_argv_rejected),
    TestCase::new("process_oversized_layout_rejected", test_oversized_layout_rejected),
    TestCase::new("process_oversized_memory_rejected", test_oversized_memory_rejected),
    TestCase::new("process_cross_page_copy", test_cross_page_copy),
    TestCase::new("process_readonly_write_stops_copy", test_readonly_write_stops_copy),
    TestCase::new("process_partial_read_at_end", test_partial_read_at_end),
    TestCase::new("process_static_mode", test_static_mode),
    TestCase::new("process_switch_under_eviction", test_switch_under_eviction),
    TestCase::new("process_pids_increment", test_pids_increment),
    TestCase::new("process_address_error_terminates", test_address_error_terminates),
    TestCase::new("process_shutdown_removes_swap", test_shutdown_removes_swap),
];

/// Imagem de 3 páginas + 2 de pilha + argv: 6 páginas, SP no topo da pilha
fn test_layout_and_argv() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let process = ktest_try!(
        kernel.spawn("prog", sample_image(2, 1), &["prog", "-v"]),
        "(PROC) spawn"
    );

    ktest_assert!(process.num_pages() == 6, "(PROC) num_pages=", process.num_pages());
    ktest_assert!(process.initial_sp().as_u32() == 320, "(PROC) sp=", process.initial_sp().as_u32());
    ktest_assert!(process.argc() == 2, "(PROC) argc");
    ktest_assert!(process.argv() == process.initial_sp(), "(PROC) argv fora da última página");

    let mut pointers = [0u8; 8];
    ktest_assert!(process.read_virtual_memory(process.argv(), &mut pointers) == 8, "(PROC) leitura argv");
    let first = u32::from_le_bytes([pointers[0], pointers[1], pointers[2], pointers[3]]);
    let second = u32::from_le_bytes([pointers[4], pointers[5], pointers[6], pointers[7]]);
    ktest_assert!(first == 328 && second == 333, "(PROC) ponteiros=", first, second);

    let arg0 = process.read_virtual_string(VirtAddr::new(first), 16);
    let arg1 = process.read_virtual_string(VirtAddr::new(second), 16);
    ktest_assert!(arg0.as_deref() == Some("prog"), "(PROC) argv[0]");
    ktest_assert!(arg1.as_deref() == Some("-v"), "(PROC) argv[1]");

    let mut text = [0u8; 1];
    ktest_assert!(process.read_virtual_memory(vaddr(1, 5), &mut text) == 1, "(PROC) leitura text");
    ktest_assert!(text[0] == 0x11, "(PROC) conteúdo da imagem=", text[0]);
    TestResult::Passed
}

/// Seções com buraco: rejeitado sem tocar na memória
fn test_fragmented_image_rejected() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let page = [0xaau8; TEST_PAGE_SIZE];
    let image = Arc::new(
        MemoryImage::builder(TEST_PAGE_SIZE)
            .section(".text", true, &page)
            .section_at(".data", 5, false, &page)
            .build(),
    );

    let result = kernel.spawn("frag", image, &[]);
    ktest_assert!(matches!(result, Err(MmError::InvalidImage)), "(PROC) imagem fragmentada aceita");
    ktest_assert!(kernel.free_pages() == 4, "(PROC) páginas vazaram");
    if let Some(pager) = kernel.pager() {
        ktest_assert!(pager.lock().swap.pending_count() == 0, "(PROC) pending vazou");
    }
    TestResult::Passed
}

fn test_oversized_argv_rejected() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let big = "x".repeat(TEST_PAGE_SIZE);
    let result = kernel.spawn("big", sample_image(1, 0), &[big.as_str()]);
    ktest_assert!(matches!(result, Err(MmError::InvalidImage)), "(PROC) argv grande aceito");
    ktest_assert!(kernel.free_pages() == 4, "(PROC) páginas vazaram");
    TestResult::Passed
}

/// Pilha que empurra o topo além de 32 bits: SP daria a volta para 0
fn test_oversized_layout_rejected() -> TestResult {
    let config = demand_config(4, 2).with_stack_pages((1 << 26) - 1);
    let kernel = ktest_try!(Kernel::boot(config), "(PROC) boot");
    let image = Arc::new(
        MemoryImage::builder(TEST_PAGE_SIZE)
            .section(".data", false, &[0xaa; TEST_PAGE_SIZE])
            .build(),
    );

    let result = kernel.spawn("wrap", image, &["hi"]);
    ktest_assert!(matches!(result, Err(MmError::InvalidImage)), "(PROC) layout de 32 bits aceito");
    ktest_assert!(kernel.free_pages() == 4, "(PROC) páginas vazaram");
    let Some(pager) = kernel.pager() else {
        return TestResult::Failed;
    };
    ktest_assert!(pager.lock().spaces.is_empty(), "(PROC) espaço registrado");
    ktest_try!(pager.check_invariants(), "(PROC) invariantes");
    TestResult::Passed
}

/// Memória física que não cabe em PhysAddr é recusada antes de alocar
fn test_oversized_memory_rejected() -> TestResult {
    let config = demand_config(1 << 20, 2).with_page_size(1 << 13);
    ktest_assert!(matches!(config.validate(), Err(MmError::InvalidParameter)), "(PROC) memória de 33 bits aceita");
    ktest_assert!(matches!(Kernel::boot(config), Err(MmError::InvalidParameter)), "(PROC) boot aceitou");

    let limit = demand_config(1 << 19, 2).with_page_size(1 << 13);
    ktest_try!(limit.validate(), "(PROC) 4 GiB exatos recusados");
    TestResult::Passed
}

/// Cópia atravessando três páginas com só 4 páginas físicas e TLB de 2
fn test_cross_page_copy() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let process = ktest_try!(kernel.spawn("copy", sample_image(1, 1), &[]), "(PROC) spawn");

    let data: Vec<u8> = (0..100u8).collect();
    let start = vaddr(2, 30);
    ktest_assert!(process.write_virtual_memory(start, &data) == 100, "(PROC) escrita cruzando páginas");

    let mut back = vec![0u8; 100];
    ktest_assert!(process.read_virtual_memory(start, &mut back) == 100, "(PROC) leitura cruzando páginas");
    ktest_assert!(back == data, "(PROC) conteúdo divergente");
    if let Some(pager) = kernel.pager() {
        ktest_try!(pager.check_invariants(), "(PROC) invariantes");
    }
    TestResult::Passed
}

/// Escrita no text para a cópia mas não mata o processo
fn test_readonly_write_stops_copy() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let process = ktest_try!(kernel.spawn("ro", sample_image(1, 1), &[]), "(PROC) spawn");

    ktest_assert!(process.write_virtual_memory(vaddr(0, 0), &[1, 2, 3]) == 0, "(PROC) escreveu no text");
    ktest_assert!(process.state() != ProcessState::Terminated, "(PROC) processo morto pela cópia");

    let mut byte = [0u8; 1];
    ktest_assert!(process.read_virtual_memory(vaddr(0, 0), &mut byte) == 1, "(PROC) leitura text");
    ktest_assert!(byte[0] == 0x10, "(PROC) text alterado");
    TestResult::Passed
}

fn test_partial_read_at_end() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let process = ktest_try!(kernel.spawn("end", sample_image(1, 1), &[]), "(PROC) spawn");

    let end = process.num_pages() * TEST_PAGE_SIZE;
    let mut buf = [0u8; 32];
    let n = process.read_virtual_memory(VirtAddr::new((end - 20) as u32), &mut buf);
    ktest_assert!(n == 20, "(PROC) bytes lidos=", n);
    ktest_assert!(process.read_virtual_memory(VirtAddr::new(end as u32), &mut buf) == 0, "(PROC) leitura fora");
    TestResult::Passed
}

/// Modo estático: tudo alocado no load, OOM no segundo processo
fn test_static_mode() -> TestResult {
    let config = demand_config(6, 2).with_mode(TranslationMode::Static);
    let kernel = ktest_try!(Kernel::boot(config), "(PROC) boot");
    ktest_assert!(kernel.pager().is_none(), "(PROC) pager no modo estático");

    let mut first = ktest_try!(kernel.spawn("a", sample_image(1, 1), &["a"]), "(PROC) spawn");
    ktest_assert!(kernel.free_pages() == 1, "(PROC) livres=", kernel.free_pages());

    let mut byte = [0u8; 1];
    ktest_assert!(first.read_virtual_memory(vaddr(1, 0), &mut byte) == 1, "(PROC) leitura data");
    ktest_assert!(byte[0] == 0x80, "(PROC) data=", byte[0]);
    ktest_assert!(first.write_virtual_memory(vaddr(1, 0), &[9]) == 1, "(PROC) escrita data");
    ktest_assert!(first.write_virtual_memory(vaddr(0, 0), &[9]) == 0, "(PROC) escrita text");
    ktest_assert!(first.read_virtual_string(VirtAddr::new(first.argv().as_u32() + 4), 8).as_deref() == Some("a"), "(PROC) argv");

    let second = kernel.spawn("b", sample_image(1, 1), &[]);
    ktest_assert!(matches!(second, Err(MmError::OutOfMemory)), "(PROC) segundo processo coube");
    ktest_assert!(kernel.free_pages() == 1, "(PROC) OOM vazou páginas");

    first.exit(0);
    ktest_assert!(kernel.free_pages() == 6, "(PROC) exit não liberou");
    TestResult::Passed
}

/// Dois processos disputando 3 páginas físicas, trocando de contexto
fn test_switch_under_eviction() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(3, 2)), "(PROC) boot");
    let mut a = ktest_try!(kernel.spawn("a", sample_image(0, 1), &[]), "(PROC) spawn a");
    let mut b = ktest_try!(kernel.spawn("b", sample_image(0, 1), &[]), "(PROC) spawn b");

    kernel.context_switch(None, &mut a);
    for round in 0..3u8 {
        for vpn in 0..a.num_pages() as u32 {
            let value_a = [0x40 + vpn as u8 + round; 8];
            ktest_assert!(a.write_virtual_memory(vaddr(vpn, 8), &value_a) == 8, "(PROC) escrita a");
        }
        kernel.context_switch(Some(&mut a), &mut b);
        for vpn in 0..b.num_pages() as u32 {
            let value_b = [0xc0 + vpn as u8 + round; 8];
            ktest_assert!(b.write_virtual_memory(vaddr(vpn, 8), &value_b) == 8, "(PROC) escrita b");
        }
        kernel.context_switch(Some(&mut b), &mut a);

        for vpn in 0..a.num_pages() as u32 {
            let mut buf = [0u8; 8];
            ktest_assert!(a.read_virtual_memory(vaddr(vpn, 8), &mut buf) == 8, "(PROC) leitura a");
            ktest_assert!(buf == [0x40 + vpn as u8 + round; 8], "(PROC) a corrompido vpn=", vpn);
        }
        for vpn in 0..b.num_pages() as u32 {
            let mut buf = [0u8; 8];
            ktest_assert!(b.read_virtual_memory(vaddr(vpn, 8), &mut buf) == 8, "(PROC) leitura b");
            ktest_assert!(buf == [0xc0 + vpn as u8 + round; 8], "(PROC) b corrompido vpn=", vpn);
        }
    }

    let Some(pager) = kernel.pager() else {
        return TestResult::Failed;
    };
    ktest_try!(pager.check_invariants(), "(PROC) invariantes");
    ktest_assert!(pager.stats().evictions > 0, "(PROC) nenhuma eviction");
    ktest_assert!(pager.stats().swap_outs > 0, "(PROC) nenhum swap-out");

    a.exit(0);
    b.exit(0);
    ktest_assert!(kernel.free_pages() == 3, "(PROC) páginas vazaram");
    let state = pager.lock();
    ktest_assert!(state.swap.slots_in_use() == 0, "(PROC) slots vazaram");
    ktest_assert!(state.swap.pending_count() == 0, "(PROC) pending vazou");
    ktest_assert!(state.spaces.is_empty(), "(PROC) espaços vazaram");
    TestResult::Passed
}

fn test_pids_increment() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let first = ktest_try!(kernel.spawn("a", sample_image(1, 0), &[]), "(PROC) spawn a");
    let second = ktest_try!(kernel.spawn("b", sample_image(1, 0), &[]), "(PROC) spawn b");
    ktest_assert!(second.pid() == first.pid() + 1, "(PROC) pids=", first.pid(), second.pid());
    TestResult::Passed
}

/// Exceção que o pager não resolve termina o processo com -1
fn test_address_error_terminates() -> TestResult {
    let kernel = ktest_try!(Kernel::boot(demand_config(4, 2)), "(PROC) boot");
    let mut process = ktest_try!(kernel.spawn("bad", sample_image(1, 1), &[]), "(PROC) spawn");

    let mut byte = [0u8; 1];
    ktest_assert!(process.read_virtual_memory(vaddr(1, 0), &mut byte) == 1, "(PROC) leitura");

    let result = process.handle_exception(Exception::AddressError, vaddr(1, 0));
    ktest_assert!(result != crate::mm::fault::FaultResult::Success, "(PROC) exceção resolvida");
    ktest_assert!(process.state() == ProcessState::Terminated, "(PROC) processo vivo");
    ktest_assert!(process.exit_status() == Some(-1), "(PROC) status de saída");
    ktest_assert!(kernel.free_pages() == 4, "(PROC) páginas vazaram");
    ktest_assert!(process.read_virtual_memory(vaddr(1, 0), &mut byte) == 0, "(PROC) leitura pós-exit");
    TestResult::Passed
}

/// Swap em arquivo do host: some no shutdown
fn test_shutdown_removes_swap() -> TestResult {
    let path = std::env::temp_dir().join(format!("forge-pager-{}-shutdown.swap", std::process::id()));
    let config = demand_config(2, 2).with_swap(SwapBacking::File(path.clone()));
    let kernel = ktest_try!(Kernel::boot(config), "(PROC) boot");
    ktest_assert!(path.exists(), "(PROC) arquivo de swap não criado");

    {
        let process = ktest_try!(kernel.spawn("swap", sample_image(0, 1), &[]), "(PROC) spawn");
        for vpn in 0..process.num_pages() as u32 {
            ktest_assert!(process.write_virtual_memory(vaddr(vpn, 0), &[vpn as u8 + 1; 4]) == 4, "(PROC) escrita");
        }
        for vpn in 0..process.num_pages() as u32 {
            let mut buf = [0u8; 4];
            ktest_assert!(process.read_virtual_memory(vaddr(vpn, 0), &mut buf) == 4, "(PROC) leitura");
            ktest_assert!(buf == [vpn as u8 + 1; 4], "(PROC) swap corrompeu vpn=", vpn);
        }
    }

    kernel.shutdown();
    ktest_assert!(!path.exists(), "(PROC) arquivo de swap sobreviveu ao shutdown");
    TestResult::Passed
}
