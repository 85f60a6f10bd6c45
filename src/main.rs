// ==========================================
// Sistema MES - Binário operacional
// ==========================================
// Uso:
//   producao-mes <db> init               cria/migra o schema
//   producao-mes <db> import <dir>       importa catálogo CSV
//   producao-mes <db> progressao <lote>  imprime a progressão (JSON)
// ==========================================

use std::error::Error;
use std::path::Path;

use producao_mes::api::ProducaoApi;
use producao_mes::config::ConfigManager;
use producao_mes::db::open_shared_connection;
use producao_mes::importer::CatalogoImporter;
use producao_mes::repository::{
    ApontamentoRepository, FaseRepository, LoteRepository, MaquinaRepository, ProdutoRepository,
};
use producao_mes::{logging, APP_NAME, VERSION};
use tracing::info;

fn uso() -> ! {
    eprintln!(
        "uso: producao-mes <db> init | import <dir> | progressao <lote_id>"
    );
    std::process::exit(2);
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    info!(app = APP_NAME, versao = VERSION, "iniciando");

    let args: Vec<String> = std::env::args().collect();
    let (db_path, comando) = match (args.get(1), args.get(2)) {
        (Some(db), Some(cmd)) => (db.as_str(), cmd.as_str()),
        _ => uso(),
    };

    let conn = open_shared_connection(db_path)?;

    match comando {
        // abre cada repositório uma vez para rodar o DDL
        "init" => {
            let _ = FaseRepository::from_connection(conn.clone())?;
            let _ = ProdutoRepository::from_connection(conn.clone())?;
            let _ = LoteRepository::from_connection(conn.clone())?;
            let _ = MaquinaRepository::from_connection(conn.clone())?;
            let _ = ApontamentoRepository::from_connection(conn.clone())?;
            let _ = ConfigManager::from_connection(conn)?;
            info!(db = db_path, "schema criado");
        }
        "import" => {
            let dir = args.get(3).map(Path::new).unwrap_or_else(|| uso());
            let importer = CatalogoImporter::from_connection(conn)?;
            let resumos = importer.importar_diretorio(dir)?;
            for resumo in &resumos {
                println!(
                    "{}: {} importado(s), {} rejeitado(s)",
                    resumo.arquivo,
                    resumo.importados,
                    resumo.rejeitados.len()
                );
                for rejeicao in &resumo.rejeitados {
                    println!("  linha {}: {}", rejeicao.linha, rejeicao.motivo);
                }
            }
        }
        "progressao" => {
            let lote_id: i64 = args
                .get(3)
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| uso());
            let api = ProducaoApi::from_connection(conn)?;
            let progressao = api.obter_progressao(lote_id)?;
            println!("{}", serde_json::to_string_pretty(&progressao)?);
        }
        _ => uso(),
    }

    Ok(())
}
