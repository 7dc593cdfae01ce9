//! Shared fixtures for repository integration tests.

use meridian_core::types::DbId;
use meridian_db::models::catalog::Course;
use meridian_db::models::question::{CreateQuestion, CreateQuestionOption, Question};
use meridian_db::models::user::{CreateUser, User};
use meridian_db::repositories::{QuestionRepo, UserRepo};
use sqlx::PgPool;

pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role: "student".to_string(),
            display_name: "Test Student".to_string(),
            career_goal: None,
        },
    )
    .await
    .expect("user insert should succeed")
}

/// Insert a course -> subject -> module chain, returning
/// (course_id, subject_id, module_id).
pub async fn seed_module(pool: &PgPool, course_title: &str) -> (DbId, DbId, DbId) {
    let course: Course = sqlx::query_as(
        "INSERT INTO courses (title) VALUES ($1) \
         RETURNING id, title, description, career_goal, created_at",
    )
    .bind(course_title)
    .fetch_one(pool)
    .await
    .expect("course insert should succeed");

    let (subject_id,): (DbId,) =
        sqlx::query_as("INSERT INTO subjects (course_id, title) VALUES ($1, 'subject') RETURNING id")
            .bind(course.id)
            .fetch_one(pool)
            .await
            .expect("subject insert should succeed");

    let (module_id,): (DbId,) =
        sqlx::query_as("INSERT INTO modules (subject_id, title) VALUES ($1, 'module') RETURNING id")
            .bind(subject_id)
            .fetch_one(pool)
            .await
            .expect("module insert should succeed");

    (course.id, subject_id, module_id)
}

/// Insert an mcq question with one correct ("yes") and one incorrect
/// ("no") option.
pub async fn seed_mcq_question(pool: &PgPool, module_id: DbId) -> Question {
    let question = QuestionRepo::create(
        pool,
        &CreateQuestion {
            module_id,
            question_type: "mcq".to_string(),
            prompt: "Is this a question?".to_string(),
            image_path: None,
            points: None,
            time_limit_secs: None,
            difficulty: None,
            correct_answer: None,
            case_sensitive: None,
            exact_match: None,
            alternate_answers: None,
            keywords: None,
        },
    )
    .await
    .expect("question insert should succeed");

    for (text, correct, position) in [("yes", true, 0), ("no", false, 1)] {
        QuestionRepo::create_option(
            pool,
            &CreateQuestionOption {
                question_id: question.id,
                option_text: text.to_string(),
                is_correct: correct,
                position,
            },
        )
        .await
        .expect("option insert should succeed");
    }

    question
}
