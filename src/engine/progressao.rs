// ==========================================
// Sistema MES - Motor de progressão de fases
// ==========================================
// Responsabilidade: dado o snapshot de rota do lote e seus
// apontamentos, calcular o status por fase e identificar a
// próxima fase acionável
// Entrada: fases do lote (ordenadas) + apontamentos do lote
// Saída: ProgressaoLote (visão derivada, sem efeito colateral)
// ==========================================
// Regra central: progressão estritamente sequencial. Uma fase é
// "próxima" somente quando todas as antecessoras estão concluídas.
// ==========================================

use crate::domain::types::{ApontamentoStatus, FaseProgressoStatus};
use crate::domain::{Apontamento, FaseLote, FaseProgresso, ProgressaoLote};

pub struct ProgressaoEngine;

impl ProgressaoEngine {
    /// Calcula a progressão de um lote
    ///
    /// Cálculo puro: não lê banco, não escreve nada. O percentual
    /// interno mantém precisão completa; o arredondamento acontece
    /// apenas em `ProgressaoLote::progresso_pct`.
    pub fn calcular(
        lote_id: i64,
        fases: &[FaseLote],
        apontamentos: &[Apontamento],
    ) -> ProgressaoLote {
        let mut resultado: Vec<FaseProgresso> = Vec::with_capacity(fases.len());

        // Passo 1: status por fase, em ordem crescente
        for fase in fases {
            let finalizado = apontamentos.iter().any(|a| {
                a.fase_id == fase.fase_id && a.status == ApontamentoStatus::Finalizado
            });
            let aberto = apontamentos
                .iter()
                .find(|a| a.fase_id == fase.fase_id && a.status == ApontamentoStatus::Iniciado);

            let status = if finalizado {
                FaseProgressoStatus::Concluida
            } else if aberto.is_some() {
                FaseProgressoStatus::EmAndamento
            } else {
                FaseProgressoStatus::NaoIniciada
            };

            resultado.push(FaseProgresso {
                fase_id: fase.fase_id,
                ordem: fase.ordem,
                status,
                proxima: false,
                operador_em_andamento: aberto.map(|a| a.operador_id),
            });
        }

        // Passo 2: a primeira fase não concluída é candidata a próxima;
        // marca apenas se todas as antecessoras estão concluídas
        let candidata = resultado
            .iter()
            .position(|f| f.status != FaseProgressoStatus::Concluida);
        if let Some(idx) = candidata {
            let antecessoras_ok = resultado[..idx]
                .iter()
                .all(|f| f.status == FaseProgressoStatus::Concluida);
            if antecessoras_ok {
                resultado[idx].proxima = true;
            }
        }

        // Passo 3: fração concluída em precisão completa
        let total_fases = resultado.len();
        let fases_concluidas = resultado
            .iter()
            .filter(|f| f.status == FaseProgressoStatus::Concluida)
            .count();
        let progresso = if total_fases == 0 {
            0.0
        } else {
            fases_concluidas as f64 / total_fases as f64
        };

        ProgressaoLote {
            lote_id,
            fases: resultado,
            total_fases,
            fases_concluidas,
            progresso,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fase_lote(fase_id: i64, ordem: i64) -> FaseLote {
        FaseLote {
            id: ordem,
            lote_id: 1,
            fase_id,
            snapshot_id: "snap".to_string(),
            ordem,
            tempo_estimado_minutos: 30,
            tempo_prateleira_horas: None,
        }
    }

    fn apontamento(fase_id: i64, status: ApontamentoStatus, operador_id: i64) -> Apontamento {
        Apontamento {
            id: fase_id * 100,
            lote_id: 1,
            produto_id: 1,
            fase_id,
            operador_id,
            maquina_id: None,
            status,
            data_inicio: Utc::now().naive_utc(),
            data_fim: None,
            tempo_real_minutos: None,
            excedeu_tempo: false,
            minutos_atraso: 0,
            observacoes: None,
        }
    }

    #[test]
    fn test_lote_sem_apontamentos() {
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2), fase_lote(30, 3)];
        let progressao = ProgressaoEngine::calcular(1, &fases, &[]);

        assert_eq!(progressao.progresso_pct(), 0);
        assert!(progressao.fases[0].proxima);
        assert!(!progressao.fases[1].proxima);
        assert_eq!(progressao.fases[1].status, FaseProgressoStatus::NaoIniciada);
    }

    #[test]
    fn test_primeira_concluida_segunda_vira_proxima() {
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2), fase_lote(30, 3)];
        let apontamentos = vec![apontamento(10, ApontamentoStatus::Finalizado, 100)];
        let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);

        assert_eq!(progressao.fases[0].status, FaseProgressoStatus::Concluida);
        assert!(progressao.fases[1].proxima);
        // 1/3 arredonda para 33
        assert_eq!(progressao.progresso_pct(), 33);
    }

    #[test]
    fn test_fase_em_andamento_continua_proxima() {
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2)];
        let apontamentos = vec![apontamento(10, ApontamentoStatus::Iniciado, 100)];
        let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);

        assert_eq!(progressao.fases[0].status, FaseProgressoStatus::EmAndamento);
        assert!(progressao.fases[0].proxima);
        assert_eq!(progressao.fases[0].operador_em_andamento, Some(100));
        assert!(!progressao.fases[1].proxima);
    }

    #[test]
    fn test_no_maximo_uma_proxima() {
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2), fase_lote(30, 3)];
        // fase do meio finalizada fora de ordem (dado legado):
        // a candidata é a fase 1, e as antecessoras dela estão ok
        let apontamentos = vec![apontamento(20, ApontamentoStatus::Finalizado, 100)];
        let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);

        let proximas: Vec<_> = progressao.fases.iter().filter(|f| f.proxima).collect();
        assert_eq!(proximas.len(), 1);
        assert_eq!(proximas[0].fase_id, 10);
    }

    #[test]
    fn test_todas_concluidas_nenhuma_proxima() {
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2)];
        let apontamentos = vec![
            apontamento(10, ApontamentoStatus::Finalizado, 100),
            apontamento(20, ApontamentoStatus::Finalizado, 100),
        ];
        let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);

        assert_eq!(progressao.progresso_pct(), 100);
        assert!(progressao.concluida());
        assert!(progressao.proxima_fase().is_none());
    }

    #[test]
    fn test_rota_vazia_degenerada() {
        let progressao = ProgressaoEngine::calcular(1, &[], &[]);
        assert_eq!(progressao.progresso_pct(), 0);
        assert!(progressao.proxima_fase().is_none());
        assert!(!progressao.concluida());
    }

    #[test]
    fn test_precisao_interna_sem_deriva() {
        // 1/3 não é representável em decimal; a fração interna fica
        // exata em f64 e o arredondamento só acontece na exibição
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2), fase_lote(30, 3)];
        let apontamentos = vec![apontamento(10, ApontamentoStatus::Finalizado, 100)];

        for _ in 0..100 {
            let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);
            assert_eq!(progressao.progresso, 1.0 / 3.0);
        }
    }

    #[test]
    fn test_retrabalho_conta_uma_vez() {
        // dois apontamentos finalizados na mesma fase: a fase conta uma vez
        let fases = vec![fase_lote(10, 1), fase_lote(20, 2)];
        let apontamentos = vec![
            apontamento(10, ApontamentoStatus::Finalizado, 100),
            apontamento(10, ApontamentoStatus::Finalizado, 200),
        ];
        let progressao = ProgressaoEngine::calcular(1, &fases, &apontamentos);
        assert_eq!(progressao.fases_concluidas, 1);
        assert_eq!(progressao.progresso_pct(), 50);
    }
}
