//! Generated C, compiled and run: each test renders source and header,
//! builds them with a small driver using the system C compiler and runs the
//! driver. Skipped when no compiler is available (`$CC`, else `cc`).

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use cfsm_compiler::{generate, write_all, GenerateOptions, Outputs};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn c_compiler() -> Option<String> {
    let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
    let found = Command::new(&cc)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    found.then_some(cc)
}

fn work_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cfsm-c-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Generate `fsm.c`/`fsm.h` for `description`, compile them with `driver`
/// as `main.c` and run the result, which must exit 0.
fn build_and_run(name: &str, description: &str, driver: &str, cflags: &[&str]) {
    let Some(cc) = c_compiler() else {
        eprintln!("skipping {name}: no C compiler");
        return;
    };
    let dir = work_dir(name);
    let options = GenerateOptions::new(Outputs::SourceAndHeader)
        .with_output(dir.join("fsm.c").to_string_lossy().into_owned());
    let generated = generate(description, &format!("{name}.fsm"), &options)
        .unwrap_or_else(|e| panic!("generation failed: {e}"));
    write_all(&generated.artifacts).unwrap();
    fs::write(dir.join("main.c"), driver).unwrap();

    let compiled = Command::new(&cc)
        .current_dir(&dir)
        .args(["-std=c99", "-Wall"])
        .args(cflags)
        .args(["-o", "driver", "main.c", "fsm.c"])
        .output()
        .unwrap();
    assert!(
        compiled.status.success(),
        "{cc} failed:\n{}",
        String::from_utf8_lossy(&compiled.stderr)
    );

    let run = Command::new(dir.join("driver")).output().unwrap();
    assert!(
        run.status.success(),
        "driver failed:\n{}{}",
        String::from_utf8_lossy(&run.stdout),
        String::from_utf8_lossy(&run.stderr)
    );
}

// ─────────────────────────────────────────────────────────────────────
// Direct transitions
// ─────────────────────────────────────────────────────────────────────

const GUARDED: &str = r#"
state A initial {
    exit-precondition a_exit;
    on-exit a_leave;
    next-state B { precondition g1; precondition g2; }
}
state B {
    entry-precondition b_entry;
    on-enter b_enter;
    next-state A;
}
"#;

const GUARDED_DRIVER: &str = r##"
#include <stdio.h>
#include <string.h>

#include "fsm.h"

#define HOOK_SIG enum fsm_state current, enum fsm_state next, void *ctx
#define CHECK(cond) do { \
	if (!(cond)) { \
		printf("line %d: %s (trace: '%s')\n", __LINE__, #cond, trace); \
		return 1; \
	} \
} while (0)

static char trace[512];
static int a_exit_result;
static int g1_failures;
static int b_entry_calls;

static void note(const char *hook)
{
	strcat(trace, hook);
	strcat(trace, " ");
}

int a_exit(HOOK_SIG) { note("a_exit"); return a_exit_result; }
int g1(HOOK_SIG)
{
	note("g1");
	if (g1_failures > 0) {
		g1_failures--;
		return -1;
	}
	return 0;
}
int g2(HOOK_SIG) { note("g2"); return 0; }
int b_entry(HOOK_SIG) { note("b_entry"); b_entry_calls++; return 0; }
void a_leave(HOOK_SIG) { note("a_leave"); }
void b_enter(HOOK_SIG) { note("b_enter"); }

int main(void)
{
	struct fsm *m = (struct fsm *)&trace;

	/* initial gate */
	CHECK(fsm_init(&m, B, NULL) == CFSM_ERR_INVALID_STATE);
	CHECK(m == NULL);
	CHECK(fsm_init(&m, A, NULL) == CFSM_OK);
	CHECK(fsm_current_state(m) == A);

	/* no edge A -> A: nothing runs */
	CHECK(fsm_advance(m, A, NULL) == CFSM_ERR_INVALID_TRANSITION);
	CHECK(strcmp(trace, "") == 0);

	/* exit guard short-circuits everything after it */
	a_exit_result = 1;
	CHECK(fsm_advance(m, B, NULL) == CFSM_ERR_PRECONDITION);
	CHECK(strcmp(trace, "a_exit ") == 0);
	CHECK(b_entry_calls == 0);
	CHECK(fsm_current_state(m) == A);

	/* g1 fails once; g2 must not run */
	a_exit_result = 0;
	g1_failures = 1;
	trace[0] = '\0';
	CHECK(fsm_advance(m, B, NULL) == CFSM_ERR_PRECONDITION);
	CHECK(strcmp(trace, "a_exit g1 ") == 0);
	CHECK(fsm_current_state(m) == A);

	trace[0] = '\0';
	CHECK(fsm_advance(m, B, NULL) == CFSM_OK);
	CHECK(strcmp(trace, "a_exit g1 g2 b_entry a_leave b_enter ") == 0);
	CHECK(fsm_current_state(m) == B);

	/* name lookups */
	CHECK(strcmp(fsm_state_ntop(A), "A") == 0);
	CHECK(fsm_state_ntop((enum fsm_state)7) == NULL);
	CHECK(fsm_state_ntop((enum fsm_state)-1) == NULL);
	CHECK(strcmp(fsm_state_ntop_safe((enum fsm_state)7), "[INVALID]") == 0);
	CHECK(strcmp(fsm_state_ntop_safe(B), "B") == 0);

	fsm_free(m);
	return 0;
}
"##;

#[test]
fn direct_machine_runs_the_guard_protocol() {
    build_and_run("guarded", GUARDED, GUARDED_DRIVER, &[]);
}

// ─────────────────────────────────────────────────────────────────────
// Event-driven
// ─────────────────────────────────────────────────────────────────────

const DOOR: &str = r#"
event push { precondition door_free; callback log_push; }
event bolt;

state CLOSED initial {
    on push -> OPEN { precondition not_blocked; }
    on-exit leave_closed;
}
state OPEN {
    on-enter arrive_open;
    on bolt -> CLOSED;
}
"#;

const DOOR_DRIVER: &str = r##"
#include <stdio.h>
#include <string.h>

#include "fsm.h"

#define HOOK_SIG enum fsm_state current, enum fsm_state next, \
	enum fsm_event ev, void *ctx
#define CHECK(cond) do { \
	if (!(cond)) { \
		printf("line %d: %s (trace: '%s')\n", __LINE__, #cond, trace); \
		return 1; \
	} \
} while (0)

#ifdef ENTRY_FIRST
#define OK_TRACE "door_free not_blocked leave_closed arrive_open log_push "
#else
#define OK_TRACE "door_free not_blocked leave_closed log_push arrive_open "
#endif

static char trace[512];
static int door_free_result;
static int token;
static void *seen_ctx;

static void note(const char *hook)
{
	strcat(trace, hook);
	strcat(trace, " ");
}

int door_free(HOOK_SIG) { note("door_free"); return door_free_result; }
int not_blocked(HOOK_SIG) { note("not_blocked"); return 0; }
void leave_closed(HOOK_SIG) { note("leave_closed"); }
void arrive_open(HOOK_SIG) { note("arrive_open"); }
void log_push(HOOK_SIG)
{
	note("log_push");
	seen_ctx = ctx;
}

int main(void)
{
	struct fsm *m;

	CHECK(fsm_init(&m, OPEN, NULL) == CFSM_ERR_INVALID_STATE);
	CHECK(fsm_init(&m, CLOSED, NULL) == CFSM_OK);

	CHECK(fsm_advance(m, bolt, NULL) == CFSM_ERR_INVALID_TRANSITION);
	CHECK(strcmp(trace, "") == 0);

	/* event guard fails before the edge guard */
	door_free_result = 1;
	CHECK(fsm_advance(m, push, &token) == CFSM_ERR_PRECONDITION);
	CHECK(strcmp(trace, "door_free ") == 0);
	CHECK(fsm_current_state(m) == CLOSED);

	door_free_result = 0;
	trace[0] = '\0';
	CHECK(fsm_advance(m, push, &token) == CFSM_OK);
	CHECK(strcmp(trace, OK_TRACE) == 0);
	CHECK(seen_ctx == &token);
	CHECK(fsm_current_state(m) == OPEN);

	CHECK(fsm_advance(m, push, NULL) == CFSM_ERR_INVALID_TRANSITION);
	CHECK(fsm_advance(m, bolt, NULL) == CFSM_OK);
	CHECK(fsm_current_state(m) == CLOSED);

	CHECK(strcmp(fsm_event_ntop(bolt), "bolt") == 0);
	CHECK(fsm_event_ntop((enum fsm_event)9) == NULL);
	CHECK(strcmp(fsm_event_ntop_safe((enum fsm_event)9), "[INVALID]") == 0);

	fsm_free(m);
	return 0;
}
"##;

#[test]
fn event_machine_runs_event_guards_and_callbacks() {
    build_and_run("door", DOOR, DOOR_DRIVER, &[]);
}

#[test]
fn callback_order_option_reaches_the_c_code() {
    let description = format!("option callback-order exit-entry-event;\n{DOOR}");
    build_and_run("door-entry-first", &description, DOOR_DRIVER, &["-DENTRY_FIRST"]);
}
