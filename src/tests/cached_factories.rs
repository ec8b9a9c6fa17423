use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use pretty_assertions::assert_eq;

use super::fixtures::{CONTROLLER, USER, class_index, method};
use crate::{
    cache::InMemoryClassBoundCache,
    reflection::{
        ClassIndex, ClassName, MemberRef, Reflector,
        doc_block::{
            CachedDocBlockContextFactory, CachedDocBlockFactory, Context, DocBlock,
            DocBlockContextFactory, DocBlockFactory, ReflectionDocBlockContextFactory,
            ReflectionDocBlockFactory,
        },
    },
};

/// Counts the doc blocks created by the wrapped factory.
struct CountingDocBlockFactory {
    inner: ReflectionDocBlockFactory,
    calls: AtomicUsize,
}

impl DocBlockFactory for CountingDocBlockFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<DocBlock> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_from_reflector(reflector)
    }
}

/// Records the symbols contexts are created for.
struct RecordingContextFactory {
    inner: ReflectionDocBlockContextFactory,
    seen: Mutex<Vec<Reflector>>,
}

impl DocBlockContextFactory for RecordingContextFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<Context> {
        self.seen.lock().unwrap().push(reflector.clone());
        self.inner.create_from_reflector(reflector)
    }
}

struct Factories {
    cache: Arc<InMemoryClassBoundCache>,
    contexts: Arc<RecordingContextFactory>,
    cached_contexts: Arc<CachedDocBlockContextFactory>,
    doc_blocks: Arc<CountingDocBlockFactory>,
    cached_doc_blocks: CachedDocBlockFactory,
}

fn factories() -> Factories {
    let classes: Arc<ClassIndex> = Arc::new(class_index());
    let cache = Arc::new(InMemoryClassBoundCache::new());
    let contexts = Arc::new(RecordingContextFactory {
        inner: ReflectionDocBlockContextFactory::new(classes.clone()),
        seen: Mutex::default(),
    });
    let cached_contexts = Arc::new(CachedDocBlockContextFactory::new(
        cache.clone(),
        contexts.clone(),
    ));
    let doc_blocks = Arc::new(CountingDocBlockFactory {
        inner: ReflectionDocBlockFactory::new(classes, cached_contexts.clone()),
        calls: AtomicUsize::new(0),
    });
    let cached_doc_blocks = CachedDocBlockFactory::new(cache.clone(), doc_blocks.clone());
    Factories {
        cache,
        contexts,
        cached_contexts,
        doc_blocks,
        cached_doc_blocks,
    }
}

#[test]
fn same_member_yields_identical_doc_block() {
    let f = factories();
    let get_users = Reflector::Method(method("getUsers"));

    let first = f.cached_doc_blocks.create_from_reflector(&get_users);
    let second = f.cached_doc_blocks.create_from_reflector(&get_users);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(f.doc_blocks.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.summary(), "Lists the users.");
}

#[test]
fn members_of_a_class_share_its_partition() {
    let f = factories();
    let controller = ClassName::new(CONTROLLER);

    let get_users = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Method(method("getUsers")));
    let get_posts = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Method(method("getPosts")));
    let repository = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Property(method("repository")));

    assert!(!Arc::ptr_eq(&get_users, &get_posts));
    assert_ne!(get_users.return_type(), get_posts.return_type());
    assert_eq!(repository.var_type(), Some("ResultIterator"));
    assert_eq!(f.doc_blocks.calls.load(Ordering::SeqCst), 3);
    // Three doc blocks and the context they share.
    assert_eq!(f.cache.len_of(&controller), 4);
    assert_eq!(f.cache.len_of(&ClassName::new(USER)), 0);
}

#[test]
fn classes_and_their_members_are_cached_apart() {
    let f = factories();
    let class = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Class(ClassName::new(USER)));
    let get_name = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Method(MemberRef::new(USER, "getName")));
    let constant = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::ClassConstant(method("PER_PAGE")));

    assert!(!Arc::ptr_eq(&class, &get_name));
    assert_eq!(get_name.return_type(), Some("string"));
    assert!(class.tags().is_empty());
    assert!(constant.tags().is_empty());
    assert_eq!(f.doc_blocks.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn context_is_shared_by_class_members() {
    let f = factories();

    let from_method = f
        .cached_contexts
        .create_from_reflector(&Reflector::Method(method("getUsers")));
    let from_property = f
        .cached_contexts
        .create_from_reflector(&Reflector::Property(method("repository")));
    let from_class = f
        .cached_contexts
        .create_from_reflector(&Reflector::Class(ClassName::new(CONTROLLER)));
    let other = f
        .cached_contexts
        .create_from_reflector(&Reflector::Class(ClassName::new(USER)));

    assert!(Arc::ptr_eq(&from_method, &from_property));
    assert!(Arc::ptr_eq(&from_method, &from_class));
    assert!(!Arc::ptr_eq(&from_method, &other));
    assert_eq!(from_method.namespace(), "App\\Controller");
    assert_eq!(other.namespace(), "App\\Model");
    assert_eq!(
        *f.contexts.seen.lock().unwrap(),
        [
            Reflector::Class(ClassName::new(CONTROLLER)),
            Reflector::Class(ClassName::new(USER)),
        ],
    );
}

#[test]
fn doc_blocks_resolve_in_cached_context() {
    let f = factories();

    let doc = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Method(method("getPosts")));
    let context = f
        .cached_contexts
        .create_from_reflector(&Reflector::Class(ClassName::new(CONTROLLER)));

    assert!(Arc::ptr_eq(doc.context(), &context));
    assert_eq!(
        doc.return_type_hint().unwrap().unwrap().to_string(),
        "\\App\\Orm\\Page|\\App\\Model\\Post[]",
    );
}

#[test]
fn unknown_symbols_yield_empty_doc_blocks() {
    let f = factories();

    let doc = f
        .cached_doc_blocks
        .create_from_reflector(&Reflector::Method(MemberRef::new("App\\Ghost", "get")));

    assert!(doc.tags().is_empty());
    assert_eq!(doc.context().namespace(), "App");
    assert!(doc.context().namespace_aliases().is_empty());
}

#[test]
fn concurrent_callers_observe_single_value() {
    let f = Arc::new(factories());

    let handles = (0..8)
        .map(|_| {
            let f = f.clone();
            std::thread::spawn(move || {
                f.cached_doc_blocks
                    .create_from_reflector(&Reflector::Method(method("getUsers")))
            })
        })
        .collect::<Vec<_>>();
    let docs = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect::<Vec<_>>();

    assert!(docs.iter().all(|d| Arc::ptr_eq(d, &docs[0])));
    assert_eq!(f.doc_blocks.calls.load(Ordering::SeqCst), 1);
}
