//! Forge Pager — Binário Principal.
//!
//! Sobe a máquina simulada com pouca memória física, roda dois processos
//! que disputam páginas (forçando eviction e swap) trocando de contexto
//! entre eles, confere o conteúdo e imprime as estatísticas do pager.
//!
//! Com a feature `self_test`, executa também as suites de `mm::test`.

use std::process::ExitCode;
use std::sync::Arc;

use forge_pager::core::ProcessState;
use forge_pager::mm::addr::VirtAddr;
use forge_pager::mm::stats;
use forge_pager::{kerror, kok};
use forge_pager::{Kernel, MemoryImage, MmConfig, MmResult, Process, ProgramImage, SwapBacking};

/// Páginas físicas da demonstração (menos que a soma dos processos)
const DEMO_PHYS_PAGES: usize = 6;

/// Páginas da seção de dados de cada programa
const DEMO_DATA_PAGES: usize = 3;

fn demo_image(page_size: usize, tag: u8) -> Arc<dyn ProgramImage> {
    let text = vec![0x90u8; page_size];
    let data = vec![tag; DEMO_DATA_PAGES * page_size];
    Arc::new(
        MemoryImage::builder(page_size)
            .section(".text", true, &text)
            .section(".data", false, &data)
            .entry(VirtAddr::new(0))
            .build(),
    )
}

/// Padrão escrito em cada página de dados do processo
fn pattern(process: &Process, vpn: usize) -> u8 {
    (process.pid() as u8).wrapping_mul(0x10).wrapping_add(vpn as u8)
}

fn fill(process: &Process, page_size: usize) -> bool {
    for vpn in 1..=DEMO_DATA_PAGES {
        let data = vec![pattern(process, vpn); page_size];
        let vaddr = VirtAddr::new((vpn * page_size) as u32);
        if process.write_virtual_memory(vaddr, &data) != page_size {
            kerror!("(DEMO) escrita incompleta pid/vpn=", process.pid(), vpn);
            return false;
        }
    }
    true
}

fn verify(process: &Process, page_size: usize) -> bool {
    let mut buf = vec![0u8; page_size];
    for vpn in 1..=DEMO_DATA_PAGES {
        let vaddr = VirtAddr::new((vpn * page_size) as u32);
        if process.read_virtual_memory(vaddr, &mut buf) != page_size
            || buf.iter().any(|&b| b != pattern(process, vpn))
        {
            kerror!("(DEMO) conteúdo divergente pid/vpn=", process.pid(), vpn);
            return false;
        }
    }
    true
}

fn run_demo(kernel: &Kernel) -> MmResult<bool> {
    let page_size = kernel.config().page_size;
    let mut init = kernel.spawn("init", demo_image(page_size, 0xa0), &["init"])?;
    let mut shell = kernel.spawn("shell", demo_image(page_size, 0xb0), &["shell", "-i"])?;

    let mut ok = true;
    kernel.context_switch(None, &mut init);
    ok &= fill(&init, page_size);
    kernel.context_switch(Some(&mut init), &mut shell);
    ok &= fill(&shell, page_size);
    kernel.context_switch(Some(&mut shell), &mut init);
    ok &= verify(&init, page_size);
    kernel.context_switch(Some(&mut init), &mut shell);
    ok &= verify(&shell, page_size);

    match shell.read_virtual_string(VirtAddr::new(shell.argv().as_u32() + 8), 16) {
        Some(arg) if arg == "shell" => {}
        _ => {
            kerror!("(DEMO) argv[0] ilegível");
            ok = false;
        }
    }

    if let Some(snapshot) = kernel.stats() {
        stats::print(&snapshot);
    }

    init.exit(0);
    shell.exit(0);
    ok &= init.state() == ProcessState::Terminated && shell.state() == ProcessState::Terminated;
    ok &= kernel.free_pages() == DEMO_PHYS_PAGES;
    Ok(ok)
}

#[cfg(feature = "self_test")]
fn self_tests() -> bool {
    forge_pager::kinfo!("(BOOT) Executando self tests...");
    forge_pager::mm::test::run_paging_tests()
}

#[cfg(not(feature = "self_test"))]
fn self_tests() -> bool {
    true
}

fn main() -> ExitCode {
    let swap_path = std::env::temp_dir().join(format!("forge-pager-{}.swap", std::process::id()));
    let config = MmConfig::default()
        .with_phys_pages(DEMO_PHYS_PAGES)
        .with_swap(SwapBacking::File(swap_path));

    let kernel = match Kernel::boot(config) {
        Ok(kernel) => kernel,
        Err(err) => {
            kerror!("(BOOT) Falha no boot");
            kerror!(err.as_str());
            return ExitCode::FAILURE;
        }
    };

    let demo_ok = match run_demo(&kernel) {
        Ok(ok) => ok,
        Err(err) => {
            kerror!("(DEMO) Falha ao criar processo");
            kerror!(err.as_str());
            false
        }
    };
    let ok = demo_ok && self_tests();

    kernel.shutdown();
    if ok {
        kok!("(DEMO) Workload concluído");
        ExitCode::SUCCESS
    } else {
        kerror!("(DEMO) Workload falhou");
        ExitCode::FAILURE
    }
}
