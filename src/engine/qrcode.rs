// ==========================================
// Sistema MES - Carga útil de QR code
// ==========================================
// Interpretação na borda: o conteúdo lido vira identificador
// tipado antes de chegar aos motores.
// Formatos:
//   LOTE-{id}|PRODUTO-{id}|FASE-{id}   (etiqueta de lote)
//   maquina:{codigo}                   (etiqueta de máquina)
// ==========================================

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QrError {
    #[error("carga de QR vazia")]
    Vazia,

    #[error("formato de QR não reconhecido: {0}")]
    FormatoDesconhecido(String),

    #[error("campo {campo} inválido na carga de QR: {valor}")]
    CampoInvalido { campo: &'static str, valor: String },
}

/// Carga útil tipada de um QR code do chão de fábrica
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    Lote {
        lote_id: i64,
        produto_id: i64,
        fase_id: i64,
    },
    Maquina {
        codigo: String,
    },
}

impl QrPayload {
    /// Interpreta o texto lido do scanner
    pub fn parse(texto: &str) -> Result<Self, QrError> {
        let texto = texto.trim();
        if texto.is_empty() {
            return Err(QrError::Vazia);
        }

        if let Some(codigo) = texto.strip_prefix("maquina:") {
            if codigo.is_empty() {
                return Err(QrError::CampoInvalido {
                    campo: "codigo",
                    valor: texto.to_string(),
                });
            }
            return Ok(QrPayload::Maquina {
                codigo: codigo.to_string(),
            });
        }

        let partes: Vec<&str> = texto.split('|').collect();
        if partes.len() == 3 {
            let lote_id = Self::extrair_id(partes[0], "LOTE-", "lote_id")?;
            let produto_id = Self::extrair_id(partes[1], "PRODUTO-", "produto_id")?;
            let fase_id = Self::extrair_id(partes[2], "FASE-", "fase_id")?;
            return Ok(QrPayload::Lote {
                lote_id,
                produto_id,
                fase_id,
            });
        }

        Err(QrError::FormatoDesconhecido(texto.to_string()))
    }

    fn extrair_id(parte: &str, prefixo: &str, campo: &'static str) -> Result<i64, QrError> {
        let valor = parte
            .strip_prefix(prefixo)
            .ok_or_else(|| QrError::CampoInvalido {
                campo,
                valor: parte.to_string(),
            })?;
        valor.parse::<i64>().map_err(|_| QrError::CampoInvalido {
            campo,
            valor: parte.to_string(),
        })
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrPayload::Lote {
                lote_id,
                produto_id,
                fase_id,
            } => write!(f, "LOTE-{}|PRODUTO-{}|FASE-{}", lote_id, produto_id, fase_id),
            QrPayload::Maquina { codigo } => write!(f, "maquina:{}", codigo),
        }
    }
}
