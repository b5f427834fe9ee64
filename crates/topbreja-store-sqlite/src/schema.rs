//! SQL schema for the TopBreja SQLite store.
//!
//! Executed once at connection startup. Table and column names follow the
//! hosted database the application was first built against.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS usuario (
    usuario_id  TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    nome        TEXT NOT NULL,
    papel       TEXT NOT NULL DEFAULT 'member',   -- 'admin' | 'member'
    criado_em   TEXT NOT NULL
);

-- Beers are never deleted; status = 0 hides them.
CREATE TABLE IF NOT EXISTS cerveja (
    cerveja_id     TEXT PRIMARY KEY,
    nome           TEXT NOT NULL,
    marca          TEXT NOT NULL,
    estilo         TEXT NOT NULL,
    teor_alcoolico REAL NOT NULL,
    descricao      TEXT NOT NULL DEFAULT '',
    imagem         TEXT,
    status         INTEGER NOT NULL DEFAULT 1,
    criado_em      TEXT NOT NULL,
    atualizado_em  TEXT NOT NULL
);

-- One aggregate row per beer. Counters are recomputed from the join
-- tables with SQL aggregates, never incremented by the application.
CREATE TABLE IF NOT EXISTS ranking (
    cerveja_id        TEXT PRIMARY KEY REFERENCES cerveja(cerveja_id),
    total_votos       INTEGER NOT NULL DEFAULT 0,
    media_estrelas    REAL    NOT NULL DEFAULT 0,
    media_nota        REAL    NOT NULL DEFAULT 0,
    total_avaliacoes  INTEGER NOT NULL DEFAULT 0,
    total_favoritos   INTEGER NOT NULL DEFAULT 0,
    total_comentarios INTEGER NOT NULL DEFAULT 0,
    pontuacao         REAL    NOT NULL DEFAULT 0,
    posicao           INTEGER,
    atualizado_em     TEXT    NOT NULL
);

-- Toggles: one row per (user, beer); toggling flips `deletado`.
CREATE TABLE IF NOT EXISTS voto (
    voto_id       TEXT PRIMARY KEY,
    usuario_id    TEXT NOT NULL REFERENCES usuario(usuario_id),
    cerveja_id    TEXT NOT NULL REFERENCES cerveja(cerveja_id),
    criado_em     TEXT NOT NULL,
    atualizado_em TEXT NOT NULL,
    deletado      INTEGER NOT NULL DEFAULT 0,
    UNIQUE (usuario_id, cerveja_id)
);

CREATE TABLE IF NOT EXISTS favorito (
    favorito_id   TEXT PRIMARY KEY,
    usuario_id    TEXT NOT NULL REFERENCES usuario(usuario_id),
    cerveja_id    TEXT NOT NULL REFERENCES cerveja(cerveja_id),
    criado_em     TEXT NOT NULL,
    atualizado_em TEXT NOT NULL,
    deletado      INTEGER NOT NULL DEFAULT 0,
    UNIQUE (usuario_id, cerveja_id)
);

CREATE TABLE IF NOT EXISTS avaliacao (
    avaliacao_id  TEXT PRIMARY KEY,
    usuario_id    TEXT NOT NULL REFERENCES usuario(usuario_id),
    cerveja_id    TEXT NOT NULL REFERENCES cerveja(cerveja_id),
    estrelas      INTEGER NOT NULL CHECK (estrelas BETWEEN 1 AND 5),
    nota          INTEGER CHECK (nota BETWEEN 0 AND 10),
    resenha       TEXT,
    criado_em     TEXT NOT NULL,
    atualizado_em TEXT NOT NULL,
    deletado      INTEGER NOT NULL DEFAULT 0,
    UNIQUE (usuario_id, cerveja_id)
);

CREATE TABLE IF NOT EXISTS comentario (
    comentario_id TEXT PRIMARY KEY,
    usuario_id    TEXT NOT NULL REFERENCES usuario(usuario_id),
    cerveja_id    TEXT NOT NULL REFERENCES cerveja(cerveja_id),
    texto         TEXT NOT NULL,
    criado_em     TEXT NOT NULL,
    deletado      INTEGER NOT NULL DEFAULT 0
);

-- Derived from ranking positions; rewritten on every refresh.
CREATE TABLE IF NOT EXISTS selo (
    cerveja_id   TEXT PRIMARY KEY REFERENCES cerveja(cerveja_id),
    tier         TEXT NOT NULL,   -- 'gold' | 'silver' | 'bronze'
    posicao      INTEGER NOT NULL,
    atribuido_em TEXT NOT NULL
);

-- Sessions issued by the authentication provider. Only a SHA-256 of the
-- bearer token is stored.
CREATE TABLE IF NOT EXISTS sessao (
    token_hash TEXT PRIMARY KEY,
    usuario_id TEXT NOT NULL REFERENCES usuario(usuario_id),
    expira_em  TEXT NOT NULL,
    revogada   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS cerveja_nome_idx       ON cerveja(nome);
CREATE INDEX IF NOT EXISTS voto_cerveja_idx       ON voto(cerveja_id);
CREATE INDEX IF NOT EXISTS favorito_cerveja_idx   ON favorito(cerveja_id);
CREATE INDEX IF NOT EXISTS favorito_usuario_idx   ON favorito(usuario_id);
CREATE INDEX IF NOT EXISTS avaliacao_cerveja_idx  ON avaliacao(cerveja_id);
CREATE INDEX IF NOT EXISTS comentario_cerveja_idx ON comentario(cerveja_id);

PRAGMA user_version = 1;
";
