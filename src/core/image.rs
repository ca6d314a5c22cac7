//! Imagem de Programa.
//!
//! Contrato mínimo que o carregador consome de um executável: seções
//! (vpn inicial, páginas, somente-leitura), leitura página a página e o
//! entry point. O parser de formato fica fora do pager.

use std::collections::HashMap;
use std::sync::Arc;

use crate::mm::addr::{VirtAddr, Vpn};
use crate::mm::error::{MmError, MmResult};

/// Seção carregável de uma imagem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub first_vpn: Vpn,
    pub num_pages: usize,
    pub read_only: bool,
}

/// Executável já parseado
pub trait ProgramImage: Send + Sync {
    fn sections(&self) -> &[Section];

    /// Lê a página `page` da seção `section` para `buf` (uma página inteira)
    fn read_section_page(&self, section: usize, page: usize, buf: &mut [u8]) -> MmResult<()>;

    fn is_read_only(&self, section: usize) -> bool {
        self.sections().get(section).is_some_and(|s| s.read_only)
    }

    fn entry_point(&self) -> VirtAddr;
}

// =============================================================================
// IMAGEM EM MEMÓRIA
// =============================================================================

/// Imagem montada em memória (testes, demonstrações)
pub struct MemoryImage {
    page_size: usize,
    sections: Vec<Section>,
    contents: Vec<Vec<u8>>,
    entry: VirtAddr,
}

impl MemoryImage {
    pub fn builder(page_size: usize) -> MemoryImageBuilder {
        MemoryImageBuilder {
            page_size,
            next_vpn: 0,
            sections: Vec::new(),
            contents: Vec::new(),
            entry: VirtAddr::new(0),
        }
    }
}

impl ProgramImage for MemoryImage {
    fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn read_section_page(&self, section: usize, page: usize, buf: &mut [u8]) -> MmResult<()> {
        let data = self.contents.get(section).ok_or(MmError::OutOfBounds)?;
        if buf.len() != self.page_size || page >= self.sections[section].num_pages {
            return Err(MmError::InvalidParameter);
        }

        let start = (page * self.page_size).min(data.len());
        let end = (start + self.page_size).min(data.len());
        let len = end - start;
        buf[..len].copy_from_slice(&data[start..end]);
        buf[len..].fill(0);
        Ok(())
    }

    fn entry_point(&self) -> VirtAddr {
        self.entry
    }
}

pub struct MemoryImageBuilder {
    page_size: usize,
    next_vpn: Vpn,
    sections: Vec<Section>,
    contents: Vec<Vec<u8>>,
    entry: VirtAddr,
}

impl MemoryImageBuilder {
    /// Adiciona uma seção logo depois da anterior
    pub fn section(self, name: &str, read_only: bool, data: &[u8]) -> Self {
        let vpn = self.next_vpn;
        self.section_at(name, vpn, read_only, data)
    }

    /// Adiciona uma seção numa vpn explícita
    pub fn section_at(mut self, name: &str, first_vpn: Vpn, read_only: bool, data: &[u8]) -> Self {
        let num_pages = data.len().div_ceil(self.page_size);
        self.sections.push(Section {
            name: name.to_string(),
            first_vpn,
            num_pages,
            read_only,
        });
        self.contents.push(data.to_vec());
        self.next_vpn = first_vpn + num_pages as Vpn;
        self
    }

    pub fn entry(mut self, entry: VirtAddr) -> Self {
        self.entry = entry;
        self
    }

    pub fn build(self) -> MemoryImage {
        MemoryImage {
            page_size: self.page_size,
            sections: self.sections,
            contents: self.contents,
            entry: self.entry,
        }
    }
}

// =============================================================================
// PÁGINAS DA IMAGEM
// =============================================================================

/// Origem de uma vpn dentro da imagem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePage {
    pub section: usize,
    pub page: usize,
    pub read_only: bool,
}

/// Índice vpn → (seção, página) de uma imagem carregada
pub struct ImagePages {
    image: Arc<dyn ProgramImage>,
    pages: HashMap<Vpn, ImagePage>,
    num_pages: usize,
}

impl ImagePages {
    /// Indexa a imagem. As seções precisam ser contíguas a partir da vpn 0.
    pub fn new(image: Arc<dyn ProgramImage>) -> MmResult<Self> {
        let mut pages = HashMap::new();
        let mut next_vpn: Vpn = 0;

        for (index, section) in image.sections().iter().enumerate() {
            if section.first_vpn != next_vpn {
                crate::kerror!("(LOADER) Executável fragmentado, vpn esperada/achada=", next_vpn, section.first_vpn);
                return Err(MmError::InvalidImage);
            }
            for page in 0..section.num_pages {
                pages.insert(
                    next_vpn + page as Vpn,
                    ImagePage {
                        section: index,
                        page,
                        read_only: image.is_read_only(index),
                    },
                );
            }
            next_vpn += section.num_pages as Vpn;
        }

        Ok(Self {
            image,
            pages,
            num_pages: next_vpn as usize,
        })
    }

    /// Páginas cobertas pelas seções
    #[inline]
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    #[inline]
    pub fn locate(&self, vpn: Vpn) -> Option<ImagePage> {
        self.pages.get(&vpn).copied()
    }

    pub fn vpns(&self) -> impl Iterator<Item = Vpn> + '_ {
        self.pages.keys().copied()
    }

    /// Carrega a página `vpn` da imagem em `buf`. Devolve se é read-only.
    pub fn load(&self, vpn: Vpn, buf: &mut [u8]) -> MmResult<bool> {
        let page = self.locate(vpn).ok_or(MmError::InvalidAddress)?;
        self.image.read_section_page(page.section, page.page, buf)?;
        Ok(page.read_only)
    }

    pub fn entry_point(&self) -> VirtAddr {
        self.image.entry_point()
    }
}
