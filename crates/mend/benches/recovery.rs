use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mend::{
    Atn, AtnBuilder, BufferedTokenStream, DefaultErrorStrategy, ErrorStrategy, ParseSession,
    Recognizer, StateId, StateKind, TokenKind, TokenStream, Vocabulary,
};

const LBRACE: TokenKind = TokenKind(1);
const RBRACE: TokenKind = TokenKind(2);
const COMMA: TokenKind = TokenKind(3);
const ITEM: TokenKind = TokenKind(4);
const JUNK: TokenKind = TokenKind(5);

/// `list : '{' ITEM (',' ITEM)* '}'`, returning the loop decision state.
fn grammar() -> (Arc<Atn>, Arc<Vocabulary>, StateId) {
    let mut b = AtnBuilder::new(JUNK);
    let (list, start, stop) = b.add_rule("list");
    let first = b.add_state(list, StateKind::Basic);
    let loop_entry = b.add_state(list, StateKind::StarLoopEntry);
    let next = b.add_state(list, StateKind::Basic);
    b.atom(start, LBRACE, first);
    b.atom(first, ITEM, loop_entry);
    b.atom(loop_entry, COMMA, next);
    b.atom(next, ITEM, loop_entry);
    b.atom(loop_entry, RBRACE, stop);

    let atn = b.build().unwrap();
    let vocab = Vocabulary::from_entries([
        (LBRACE, Some("'{'"), None),
        (RBRACE, Some("'}'"), None),
        (COMMA, Some("','"), None),
        (ITEM, None, Some("ITEM")),
        (JUNK, None, Some("JUNK")),
    ]);
    (Arc::new(atn), Arc::new(vocab), loop_entry)
}

fn session(atn: &Arc<Atn>, vocab: &Arc<Vocabulary>, kinds: Vec<TokenKind>) -> ParseSession {
    ParseSession::new(
        atn.clone(),
        vocab.clone(),
        BufferedTokenStream::from_kinds(kinds),
    )
}

fn bench_sync_fast_path(c: &mut Criterion) {
    let (atn, vocab, loop_entry) = grammar();
    let strategy = DefaultErrorStrategy::new();
    let mut s = session(&atn, &vocab, vec![COMMA, ITEM, RBRACE]);
    s.set_state(loop_entry);

    c.bench_function("sync_fast_path", |b| {
        b.iter(|| strategy.sync(black_box(&mut s)));
    });
}

fn bench_sync_garbage(c: &mut Criterion) {
    let (atn, vocab, loop_entry) = grammar();
    let strategy = DefaultErrorStrategy::new();
    let mut group = c.benchmark_group("sync_garbage");

    for len in [16usize, 256, 4096] {
        let mut kinds = vec![JUNK; len];
        kinds.push(RBRACE);
        let mut s = session(&atn, &vocab, kinds);

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                s.input_mut().seek(0);
                s.set_state(loop_entry);
                strategy.sync(&mut s);
                black_box(s.input().index())
            });
        });
    }

    group.finish();
}

fn bench_recover_inline(c: &mut Criterion) {
    let (atn, vocab, loop_entry) = grammar();
    let strategy = DefaultErrorStrategy::new();
    let mut group = c.benchmark_group("recover_inline");

    let mut deletion = session(&atn, &vocab, vec![JUNK, RBRACE]);
    group.bench_function("deletion", |b| {
        b.iter(|| {
            deletion.reset();
            deletion.set_state(loop_entry);
            black_box(strategy.recover_inline(&mut deletion).unwrap())
        });
    });

    let mut insertion = session(&atn, &vocab, vec![JUNK, JUNK]);
    group.bench_function("insertion", |b| {
        b.iter(|| {
            insertion.reset();
            insertion.set_state(loop_entry);
            black_box(strategy.recover_inline(&mut insertion).unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sync_fast_path,
    bench_sync_garbage,
    bench_recover_inline
);
criterion_main!(benches);
