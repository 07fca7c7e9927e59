//! In-process storage backend.
//!
//! Implements every repository trait over a single lock-protected state so
//! the service can run without PostgreSQL (`STORAGE_BACKEND=memory`) and
//! the API tests can exercise real storage semantics. Similarity search
//! uses the same cosine formula as the `match_notes` SQL function.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use tokio::sync::RwLock;
use uuid::Uuid;

use vault_core::{
    ApplyNoteUpdate, EmbeddingChange, EmbeddingRepository, Error, InsertNote, NewEmbedding,
    NewUser, Note, NoteEmbedding, NoteMatch, NoteRepository, NoteType, Result, SessionRepository,
    Tag, TagRepository, User, UserCredentials, UserRepository,
};

struct StoredNote {
    /// Insertion order, used to break created_at ties in listings.
    seq: u64,
    owner_id: Uuid,
    title: String,
    content: String,
    note_type: NoteType,
    tag_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredSession {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct MemoryState {
    next_seq: u64,
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, StoredSession>,
    notes: HashMap<Uuid, StoredNote>,
    tags: HashMap<Uuid, Tag>,
    tag_ids_by_name: HashMap<String, Uuid>,
    /// Keyed by note id; at most one embedding per note.
    embeddings: HashMap<Uuid, NoteEmbedding>,
}

impl MemoryState {
    fn hydrate(&self, id: Uuid, stored: &StoredNote) -> Note {
        Note {
            id,
            title: stored.title.clone(),
            content: stored.content.clone(),
            note_type: stored.note_type,
            tags: stored
                .tag_ids
                .iter()
                .filter_map(|tag_id| self.tags.get(tag_id).cloned())
                .collect(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            vector_id: self.embeddings.get(&id).map(|e| e.id),
        }
    }

    fn owned(&self, owner_id: Uuid, id: Uuid) -> Result<&StoredNote> {
        self.notes
            .get(&id)
            .filter(|n| n.owner_id == owner_id)
            .ok_or(Error::NoteNotFound(id))
    }

    fn put_embedding(&mut self, note_id: Uuid, embedding: NewEmbedding) {
        let id = self
            .embeddings
            .get(&note_id)
            .map(|e| e.id)
            .unwrap_or_else(Uuid::now_v7);
        self.embeddings.insert(
            note_id,
            NoteEmbedding {
                id,
                note_id,
                vector: embedding.vector,
                model: embedding.model,
                created_at: Utc::now(),
            },
        );
    }
}

/// Cosine similarity of two vectors; zero when either has zero norm.
pub fn cosine_similarity(a: &Vector, b: &Vector) -> Result<f64> {
    let a = a.as_slice();
    let b = b.as_slice();
    if a.len() != b.len() {
        return Err(Error::Search(format!(
            "Vector dimension mismatch: {} != {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let a_norm: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let b_norm: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if a_norm == 0.0 || b_norm == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (a_norm * b_norm))
}

/// In-memory implementation of all repository traits.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored embeddings across all users.
    pub async fn embedding_count(&self) -> usize {
        self.state.read().await.embeddings.len()
    }

    /// Number of tags across all users.
    pub async fn tag_count(&self) -> usize {
        self.state.read().await.tags.len()
    }

    /// Number of stored sessions, including revoked ones not yet purged.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn insert(&self, req: InsertNote) -> Result<Note> {
        let mut state = self.state.write().await;
        if let Some(missing) = req.tag_ids.iter().find(|id| !state.tags.contains_key(*id)) {
            return Err(Error::NotFound(format!("Tag {}", missing)));
        }

        let id = Uuid::now_v7();
        let now = Utc::now();
        state.next_seq += 1;
        let mut tag_ids = req.tag_ids;
        dedupe(&mut tag_ids);
        let stored = StoredNote {
            seq: state.next_seq,
            owner_id: req.owner_id,
            title: req.title,
            content: req.content,
            note_type: req.note_type,
            tag_ids,
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(id, stored);
        if let Some(embedding) = req.embedding {
            state.put_embedding(id, embedding);
        }

        let stored = state.owned(req.owner_id, id)?;
        Ok(state.hydrate(id, stored))
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<Note> {
        let state = self.state.read().await;
        let stored = state.owned(owner_id, id)?;
        Ok(state.hydrate(id, stored))
    }

    async fn fetch_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Note>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| {
                state
                    .owned(owner_id, *id)
                    .ok()
                    .map(|stored| state.hydrate(*id, stored))
            })
            .collect())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        let state = self.state.read().await;
        let mut owned: Vec<(&Uuid, &StoredNote)> = state
            .notes
            .iter()
            .filter(|(_, n)| n.owner_id == owner_id)
            .collect();
        owned.sort_by(|(_, a), (_, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(owned
            .into_iter()
            .map(|(id, stored)| state.hydrate(*id, stored))
            .collect())
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, req: ApplyNoteUpdate) -> Result<Note> {
        let mut state = self.state.write().await;
        state.owned(owner_id, id)?;
        if let Some(tag_ids) = &req.tag_ids {
            if let Some(missing) = tag_ids.iter().find(|t| !state.tags.contains_key(*t)) {
                return Err(Error::NotFound(format!("Tag {}", missing)));
            }
        }

        if let Some(stored) = state.notes.get_mut(&id) {
            if let Some(title) = req.title {
                stored.title = title;
            }
            if let Some(content) = req.content {
                stored.content = content;
            }
            if let Some(note_type) = req.note_type {
                stored.note_type = note_type;
            }
            if let Some(mut tag_ids) = req.tag_ids {
                dedupe(&mut tag_ids);
                stored.tag_ids = tag_ids;
            }
            stored.updated_at = Utc::now();
        }

        match req.embedding {
            EmbeddingChange::Keep => {}
            EmbeddingChange::Replace(embedding) => state.put_embedding(id, embedding),
            EmbeddingChange::Remove => {
                state.embeddings.remove(&id);
            }
        }

        let stored = state.owned(owner_id, id)?;
        Ok(state.hydrate(id, stored))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state.owned(owner_id, id)?;
        state.notes.remove(&id);
        state.embeddings.remove(&id);
        Ok(())
    }
}

fn dedupe(ids: &mut Vec<Uuid>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut state = self.state.write().await;
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let id = match state.tag_ids_by_name.get(name) {
                Some(id) => *id,
                None => {
                    let id = Uuid::now_v7();
                    state.tag_ids_by_name.insert(name.clone(), id);
                    state.tags.insert(
                        id,
                        Tag {
                            id,
                            name: name.clone(),
                        },
                    );
                    id
                }
            };
            tags.push(Tag {
                id,
                name: name.clone(),
            });
        }
        Ok(tags)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Tag>> {
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state
            .notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .flat_map(|n| n.tag_ids.iter())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .filter_map(|id| state.tags.get(id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let state = self.state.read().await;
        Ok(state
            .tag_ids_by_name
            .get(name)
            .and_then(|id| state.tags.get(id).cloned()))
    }
}

#[async_trait]
impl EmbeddingRepository for MemoryStore {
    async fn get_for_note(&self, note_id: Uuid) -> Result<Option<NoteEmbedding>> {
        Ok(self.state.read().await.embeddings.get(&note_id).cloned())
    }

    async fn match_notes(
        &self,
        query: &Vector,
        threshold: f64,
        count: i64,
        owner_id: Uuid,
    ) -> Result<Vec<NoteMatch>> {
        let state = self.state.read().await;
        let mut matches = Vec::new();
        for (note_id, embedding) in &state.embeddings {
            let owned = state
                .notes
                .get(note_id)
                .is_some_and(|n| n.owner_id == owner_id);
            if !owned {
                continue;
            }
            let similarity = cosine_similarity(&embedding.vector, query)?;
            if similarity >= threshold {
                matches.push(NoteMatch {
                    note_id: *note_id,
                    similarity,
                });
            }
        }
        matches.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.note_id.cmp(&b.note_id))
        });
        matches.truncate(count.max(0) as usize);
        Ok(matches)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, req: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        for existing in state.users.values() {
            if existing.user.email.eq_ignore_ascii_case(&req.email) {
                return Err(Error::Conflict("Email already registered".to_string()));
            }
            if existing.user.username == req.username {
                return Err(Error::Conflict("Username already taken".to_string()));
            }
        }

        let user = User {
            id: Uuid::now_v7(),
            email: req.email,
            username: req.username,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: req.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_credentials(&self, login: &str) -> Result<Option<UserCredentials>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|c| c.user.email.eq_ignore_ascii_case(login) || c.user.username == login)
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&id)
            .map(|c| c.user.clone()))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        // Expired sessions are dropped whenever a new one is stored.
        let now = Utc::now();
        state.sessions.retain(|_, s| s.expires_at > now);
        state.sessions.insert(
            token_hash.to_string(),
            StoredSession {
                user_id,
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn validate(&self, token_hash: &str) -> Result<Option<Uuid>> {
        let state = self.state.read().await;
        let now = Utc::now();
        Ok(state
            .sessions
            .get(token_hash)
            .filter(|s| !s.revoked && s.expires_at > now)
            .filter(|s| state.users.get(&s.user_id).is_some_and(|u| u.user.is_active))
            .map(|s| s.user_id))
    }

    async fn revoke(&self, token_hash: &str) -> Result<()> {
        if let Some(session) = self.state.write().await.sessions.get_mut(token_hash) {
            session.revoked = true;
        }
        Ok(())
    }

    async fn purge_stale(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.revoked && s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}
