//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas em MM.
//!
//! Taxonomia:
//! - **Exaustão** (`OutOfMemory`): sem página livre e sem vítima. Fatal.
//! - **Uso indevido pelo chamador** (`AlreadyMapped`, `NotMapped`,
//!   `DoubleFree`, ...): violação de contrato, devolvida ao chamador.
//! - **I/O do swap** (`SwapIo`, `SwapClosed`): falha do arquivo de backing.
//! - **Auditoria** (`InvariantViolation`): `check_invariants` achou divergência.
//!
//! Leituras de estado inconsistente (slot de swap inexistente) NÃO aparecem
//! aqui: são recuperadas localmente com página zerada e log.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem página física livre e nenhuma página residente para evictar
    OutOfMemory,
    /// Entrada já existe para (pid, vpn)
    AlreadyMapped,
    /// Entrada não existe para (pid, vpn)
    NotMapped,
    /// Página física devolvida duas vezes ao alocador
    DoubleFree,
    /// Parâmetro inválido (configuração, tamanho de buffer)
    InvalidParameter,
    /// Endereço fora do espaço de endereçamento do processo
    InvalidAddress,
    /// Escrita em página somente-leitura
    ReadOnly,
    /// Índice fora dos limites
    OutOfBounds,
    /// Imagem do programa inválida (seções fragmentadas, argv grande demais)
    InvalidImage,
    /// Falha de I/O no arquivo de swap
    SwapIo,
    /// Arquivo de swap já foi fechado
    SwapClosed,
    /// Estruturas internas do pager divergiram
    InvariantViolation,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem páginas físicas livres e nenhuma vítima residente",
            Self::AlreadyMapped => "Entrada já presente na tabela de tradução",
            Self::NotMapped => "Entrada ausente na tabela de tradução",
            Self::DoubleFree => "Double free detectado",
            Self::InvalidParameter => "Parâmetro inválido",
            Self::InvalidAddress => "Endereço inválido",
            Self::ReadOnly => "Escrita em página somente-leitura",
            Self::OutOfBounds => "Índice fora dos limites",
            Self::InvalidImage => "Imagem de programa inválida",
            Self::SwapIo => "Falha de I/O no swap",
            Self::SwapClosed => "Swap já fechado",
            Self::InvariantViolation => "Invariante do pager violado",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for MmError {}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
