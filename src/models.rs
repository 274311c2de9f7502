pub mod auth;
pub mod colaborador;
pub mod estoque;
pub mod evento;
pub mod ferramenta;
pub mod movimentacao;
pub mod obra;
pub mod relatorio;
pub mod requisicao;
