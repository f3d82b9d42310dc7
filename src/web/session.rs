use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;
use uuid::Uuid;

use crate::model::assessment::AssessmentItem;
use crate::model::{Turn, TurnRole};
use crate::shell::ShellState;

/// Experience awarded per correct quiz answer.
pub const EXPERIENCE_PER_ANSWER: u32 = 150;
/// Chat turns kept per session, and replayed to the mentor on each message.
pub const MAX_TRANSCRIPT_TURNS: usize = 20;
pub const MAX_SESSIONS: usize = 1024;
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Everything the browser-side UI would otherwise hold for one student.
#[derive(Debug)]
pub struct Session {
    pub shell: ShellState,
    pub transcript: Vec<Turn>,
    pub quiz: QuizState,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            shell: ShellState::default(),
            transcript: Vec::new(),
            quiz: QuizState::default(),
            last_seen: Instant::now(),
        }
    }
}

impl Session {
    /// Appends a user/model pair, dropping the oldest turns past the limit.
    pub fn record_exchange(&mut self, user: String, reply: String) {
        self.transcript.push(Turn::new(TurnRole::User, user));
        self.transcript.push(Turn::new(TurnRole::Model, reply));
        if self.transcript.len() > MAX_TRANSCRIPT_TURNS {
            let excess = self.transcript.len() - MAX_TRANSCRIPT_TURNS;
            self.transcript.drain(..excess);
        }
    }
}

/// In-memory sessions, bounded by an idle timeout and a capacity cap.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    capacity: usize,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS, SESSION_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Existing session only; touches its idle timer.
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        let idle_ttl = self.idle_ttl;
        match self.sessions.get(id) {
            Some(session) if session.last_seen.elapsed() > idle_ttl => {
                self.sessions.remove(id);
                None
            }
            Some(_) => {
                let session = self.sessions.get_mut(id)?;
                session.last_seen = Instant::now();
                Some(session)
            }
            None => None,
        }
    }

    /// Existing session, or a fresh one under `id`. Makes room first when full.
    pub fn get_or_create(&mut self, id: Uuid) -> &mut Session {
        if self.get_mut(&id).is_none() {
            self.evict_idle();
            if self.sessions.len() >= self.capacity {
                self.evict_oldest();
            }
            self.sessions.insert(id, Session::default());
        }
        let session = self.sessions.entry(id).or_default();
        session.last_seen = Instant::now();
        session
    }

    fn evict_idle(&mut self) {
        let idle_ttl = self.idle_ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_seen.elapsed() <= idle_ttl);
        if self.sessions.len() < before {
            debug!("Evicted {} idle sessions", before - self.sessions.len());
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, session)| session.last_seen)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            debug!("Session store full; evicting {}", id);
            self.sessions.remove(&id);
        }
    }
}

#[derive(Debug, Default)]
pub struct QuizState {
    current: Option<AssessmentItem>,
    answered: bool,
    score: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("no question has been generated for this session")]
    NoActiveQuestion,
    #[error("this question has already been answered")]
    AlreadyAnswered,
    #[error("choice {0} is not one of the options")]
    ChoiceOutOfRange(usize),
}

#[derive(Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizState {
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn experience(&self) -> u32 {
        self.score * EXPERIENCE_PER_ANSWER
    }

    pub fn present(&mut self, item: AssessmentItem) {
        self.current = Some(item);
        self.answered = false;
    }

    pub fn answer(&mut self, choice: usize) -> Result<AnswerOutcome, QuizError> {
        let item = self.current.as_ref().ok_or(QuizError::NoActiveQuestion)?;
        if self.answered {
            return Err(QuizError::AlreadyAnswered);
        }
        if choice >= item.options.len() {
            return Err(QuizError::ChoiceOutOfRange(choice));
        }

        let correct = item.is_correct(choice);
        let outcome = AnswerOutcome {
            correct,
            correct_answer: item.correct_answer,
            explanation: item.explanation.clone(),
        };
        self.answered = true;
        if correct {
            self.score += 1;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn item() -> AssessmentItem {
        AssessmentItem {
            id: Some(1),
            question: "Q".to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: 2,
            explanation: "E".to_string(),
        }
    }

    #[test]
    fn selecting_correct_index_scores() {
        let mut quiz = QuizState::default();
        quiz.present(item());
        let outcome = quiz.answer(2).unwrap();
        assert!(outcome.correct);
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.experience(), 150);
    }

    #[test]
    fn wrong_answer_reveals_correct_one_without_scoring() {
        let mut quiz = QuizState::default();
        quiz.present(item());
        let outcome = quiz.answer(0).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.correct_answer, 2);
        assert_eq!(quiz.score(), 0);
    }

    #[test]
    fn each_question_is_answered_once() {
        let mut quiz = QuizState::default();
        assert_eq!(quiz.answer(0), Err(QuizError::NoActiveQuestion));
        quiz.present(item());
        assert_eq!(quiz.answer(7), Err(QuizError::ChoiceOutOfRange(7)));
        quiz.answer(2).unwrap();
        assert_eq!(quiz.answer(2), Err(QuizError::AlreadyAnswered));
        quiz.present(item());
        assert!(quiz.answer(2).unwrap().correct);
        assert_eq!(quiz.score(), 2);
    }

    #[test]
    fn transcript_keeps_only_recent_turns() {
        let mut session = Session::default();
        for i in 0..15 {
            session.record_exchange(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(session.transcript.len(), MAX_TRANSCRIPT_TURNS);
        assert_eq!(session.transcript[0], Turn::new(TurnRole::User, "q5"));
        assert_eq!(
            session.transcript.last(),
            Some(&Turn::new(TurnRole::Model, "a14"))
        );
    }

    #[test]
    fn store_never_exceeds_capacity() {
        let mut store = SessionStore::new(8, SESSION_IDLE_TTL);
        let first = Uuid::new_v4();
        store.get_or_create(first);
        for _ in 0..500 {
            store.get_or_create(Uuid::new_v4());
        }
        assert_eq!(store.len(), 8);
        assert!(store.get_mut(&first).is_none());
    }

    #[test]
    fn lookup_does_not_create() {
        let mut store = SessionStore::default();
        assert!(store.get_mut(&Uuid::new_v4()).is_none());
        assert_eq!(store.len(), 0);

        let id = Uuid::new_v4();
        store.get_or_create(id).shell.complete(crate::shell::ModuleType::Quiz);
        assert!(store
            .get_mut(&id)
            .unwrap()
            .shell
            .is_completed(crate::shell::ModuleType::Quiz));
    }

    #[test]
    fn idle_sessions_expire() {
        let mut store = SessionStore::new(8, Duration::from_millis(20));
        let stale = Uuid::new_v4();
        store.get_or_create(stale);
        sleep(Duration::from_millis(40));
        assert!(store.get_mut(&stale).is_none());

        store.get_or_create(Uuid::new_v4());
        store.get_or_create(Uuid::new_v4());
        sleep(Duration::from_millis(40));
        store.get_or_create(Uuid::new_v4());
        assert_eq!(store.len(), 1);
    }
}
